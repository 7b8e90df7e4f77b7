//! Accumulation and display transform of shuffle statistics
//!
//! This crate keeps running count distributions of card-shuffle outcomes and
//! turns them into scored tables that show how far observed games deviate
//! from a truly random shuffle.
//!
//! # Overview
//!
//! The crate supports two workflows:
//!
//! ## Aggregation Workflow
//!
//! Fold newly played games into the accumulated distributions:
//!
//! 1. **Load Game Records** ([`game::GameRecord`]): Per-game observations from the fetch layer
//! 2. **Bucket Samples** ([`bucket::BatchDistributions`]): Group per-game samples by [`key::BucketKey`]
//! 3. **Merge Counts** ([`distribution::Distribution::merge`]): Sum same-key samples
//! 4. **Fold Into History** ([`record::AccumulatedRecord::fold`]): Read-merge-write per bucket
//! 5. **Advance the Window** ([`aggregate::run_batch`]): Track the store's high-water mark
//!
//! ## Display Workflow
//!
//! Score accumulated counts against hypergeometric expectations:
//!
//! 1. **Extrapolate** ([`top_n::extrapolate`]): Complete partially revealed libraries
//! 2. **Score Rows** ([`transform::TransformedRecord`]): Per-cell and composite chances
//! 3. **Group** ([`tree::StatTree`]): Nest records by caller-chosen key fields
//! 4. **Combine Formats** ([`best_of::insert_combined`]): Add the "all" best-of view
//!
//! # Examples
//!
//! ## Aggregating a Batch
//!
//! ```
//! use chrono::{TimeZone as _, Utc};
//! use riffle_analysis::{
//!     aggregate::{self, DEFAULT_MAX_RECORDS},
//!     game::{GameRecord, LibraryObservation},
//!     key::{BestOf, ShufflingMode},
//!     store::{DistributionStore as _, MemoryStore},
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let game = GameRecord {
//!     date: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
//!     deck_size: 40,
//!     lands_in_deck: 17,
//!     best_of: BestOf::One,
//!     shuffling: ShufflingMode::Standard,
//!     opening_hand: None,
//!     library: Some(LibraryObservation {
//!         size: 33,
//!         lands: 14,
//!         revealed: vec![true, false],
//!     }),
//!     copies: vec![],
//!     decklist: vec![],
//! };
//!
//! let mut store = MemoryStore::new();
//! let summary = aggregate::run_batch(&mut store, &[game.clone()], DEFAULT_MAX_RECORDS)?;
//! assert_eq!(summary.buckets_created, 1);
//!
//! // Already merged: nothing happens the second time
//! let summary = aggregate::run_batch(&mut store, &[game], DEFAULT_MAX_RECORDS)?;
//! assert_eq!(summary.processed, 0);
//! assert_eq!(store.records().count(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Building the Display Tree
//!
//! ```no_run
//! use riffle_analysis::{
//!     best_of,
//!     key::KeyField,
//!     store::{DistributionStore as _, MemoryStore},
//!     tree::StatTree,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let store = MemoryStore::new();
//!
//! let mut tree = StatTree::build(store.records(), &KeyField::ALL)?;
//! best_of::insert_combined(&mut tree)?;
//! for (path, record) in tree.leaves() {
//!     println!("{}: {} games, chance {:?}", path.join(" / "), record.num_games, record.chance);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod best_of;
pub mod bucket;
pub mod distribution;
pub mod game;
pub mod key;
pub mod record;
pub mod store;
pub mod top_n;
pub mod transform;
pub mod tree;
