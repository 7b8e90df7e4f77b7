//! Probability primitives for shuffle analysis.
//!
//! This crate provides the numeric building blocks used to judge whether
//! observed card distributions are consistent with a truly random shuffle:
//!
//! - **Hypergeometric distribution**: Probability of each hit count when drawing
//!   cards without replacement
//! - **Binomial tails**: Cumulative binomial probabilities with fractional bounds
//! - **Significance scoring**: Per-cell deviation scores and their composition
//!
//! # Modules
//!
//! - [`hypergeometric`]: Full hypergeometric PMF for a population/sample/hits triple
//! - [`binomial`]: Binomial CDF extended to real-valued bounds
//! - [`significance`]: Cell chances and the composite chance combinator
//!
//! # Examples
//!
//! ## Expected lands in an opening hand
//!
//! ```
//! use riffle_stats::hypergeometric::hypergeometric_distribution;
//!
//! let pmf = hypergeometric_distribution(60, 7, 24);
//! let most_likely = pmf
//!     .iter()
//!     .enumerate()
//!     .max_by(|a, b| a.1.total_cmp(b.1))
//!     .map(|(lands, _)| lands);
//! assert_eq!(most_likely, Some(3));
//! ```
//!
//! ## Scoring observed counts
//!
//! ```
//! use riffle_stats::{hypergeometric::hypergeometric_distribution, significance};
//!
//! // 100 games, top card of a 40 card library with 17 lands
//! let expected = hypergeometric_distribution(40, 1, 17);
//! let cells = significance::score_cells(100.0, &[58.0, 42.0], &expected);
//! let chance = significance::composite(cells.iter().map(|cell| cell.chance));
//! assert!(chance.unwrap() > 0.5);
//! ```

pub mod binomial;
pub mod hypergeometric;
pub mod significance;
