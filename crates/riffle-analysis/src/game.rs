//! Per-game observation records
//!
//! These are the input of the aggregation job: one record per played game,
//! already filtered for eligibility by the fetch layer. Each record carries
//! the deck's categorical attributes and whatever parts of the shuffle were
//! observed.
//!
//! # Revealed prefixes
//!
//! Library observations are the known prefix of the library from the top. The
//! card right after the prefix is unknown; nothing is known past it.
//!
//! ```text
//! revealed:  [land, spell, land]  ?  ?  ?  ...
//! position:    0      1      2    3
//!                           │     └─ first unknown
//!                           └─ counted as first_unknown
//! ```
//!
//! # Serialization
//!
//! ```json
//! {
//!   "date": "2026-08-01T12:00:00Z",
//!   "deck_size": 40,
//!   "lands_in_deck": 17,
//!   "best_of": "1",
//!   "shuffling": "smoothed",
//!   "opening_hand": { "hand_size": 7, "lands": 3 },
//!   "library": { "size": 33, "lands": 14, "revealed": [true, false, true] },
//!   "copies": [],
//!   "decklist": []
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::{BestOf, DecklistEnd, ShufflingMode};

/// A single game's observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    /// When the game was played
    pub date: DateTime<Utc>,
    /// Number of cards in the deck
    pub deck_size: u32,
    /// Number of lands in the deck
    pub lands_in_deck: u32,
    pub best_of: BestOf,
    pub shuffling: ShufflingMode,
    /// The kept opening hand, if known
    #[serde(default)]
    pub opening_hand: Option<HandObservation>,
    /// Lands in the library after the opening hand, if any card was tracked
    #[serde(default)]
    pub library: Option<LibraryObservation>,
    /// Library positions of every copy of tracked cards
    #[serde(default)]
    pub copies: Vec<CopyObservation>,
    /// Library positions of cards from the ends of the submitted decklist
    #[serde(default)]
    pub decklist: Vec<DecklistObservation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandObservation {
    pub hand_size: u32,
    pub lands: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryObservation {
    /// Cards in the library
    pub size: u32,
    /// Lands in the library
    pub lands: u32,
    /// Known prefix from the top, `true` for lands
    pub revealed: Vec<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyObservation {
    /// Cards in the library
    pub library_size: u32,
    /// Copies of the tracked card in the library
    pub copies: u32,
    /// Known prefix from the top, `true` for copies of the tracked card
    pub revealed: Vec<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecklistObservation {
    pub end: DecklistEnd,
    /// Cards in the library
    pub library_size: u32,
    /// Number of library cards that belong to the tracked decklist segment
    pub num_cards: u32,
    /// Known prefix from the top, `true` for cards from the segment
    pub revealed: Vec<bool>,
}
