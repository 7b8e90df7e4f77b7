//! Bucket keys identifying accumulated distributions
//!
//! Every accumulated distribution belongs to exactly one [`BucketKey`]: the
//! categorical attributes of the games that contributed to it. Keys are
//! totally ordered so they can index a `BTreeMap` directly; ordering carries
//! no meaning beyond stable iteration.
//!
//! # Rows and populations
//!
//! Row `i` of every distribution describes a sample of `i + 1` cards drawn
//! from the key's [`Population`]:
//!
//! | Analysis             | Rows                | Population             |
//! |----------------------|---------------------|------------------------|
//! | `LibraryLands`       | library position    | library / lands        |
//! | `CopyPositions`      | library position    | library / copies       |
//! | `HandLands`          | hand size - 1       | deck / lands           |
//! | `DecklistPosition`   | library position    | library / segment size |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum opening hand size tracked by hand distributions.
pub const MAX_HAND_SIZE: u32 = 7;

/// Match format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BestOf {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "3")]
    Three,
}

impl BestOf {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::Three => "3",
        }
    }
}

/// Label of the synthetic combined best-of view.
pub const ALL_BEST_OF_LABEL: &str = "all";

/// Shuffler used for the opening hand.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ShufflingMode {
    Standard,
    Smoothed,
}

impl ShufflingMode {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Smoothed => "smoothed",
        }
    }
}

/// End of the submitted decklist a tracked segment is taken from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DecklistEnd {
    Front,
    Back,
}

/// What a distribution tracks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Analysis {
    /// Lands by library position, with partially revealed libraries
    LibraryLands,
    /// Copies of one card by library position, with partially revealed libraries
    CopyPositions { copies: u32 },
    /// Lands in the opening hand by hand size
    HandLands,
    /// Cards from one end of the decklist by library position, fully revealed prefixes only
    DecklistPosition { end: DecklistEnd },
}

impl Analysis {
    /// Whether distributions of this kind carry `[known, first_unknown]` pairs.
    #[must_use]
    pub fn tracks_unknowns(self) -> bool {
        matches!(self, Self::LibraryLands | Self::CopyPositions { .. })
    }

    /// Whether every game contributes to every row up to its revealed length.
    ///
    /// Hand distributions are partitions instead: each game lands in exactly
    /// one row.
    #[must_use]
    pub fn is_sequence(self) -> bool {
        !matches!(self, Self::HandLands)
    }

    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::LibraryLands => "library_lands".to_owned(),
            Self::CopyPositions { copies } => format!("copy_positions_{copies}"),
            Self::HandLands => "hand_lands".to_owned(),
            Self::DecklistPosition { end: DecklistEnd::Front } => "decklist_front".to_owned(),
            Self::DecklistPosition { end: DecklistEnd::Back } => "decklist_back".to_owned(),
        }
    }
}

/// Hypergeometric population a bucket's rows are drawn from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Population {
    /// Number of cards
    pub size: u32,
    /// Number of tracked cards among them
    pub successes: u32,
}

impl Population {
    #[must_use]
    pub fn new(size: u32, successes: u32) -> Self {
        Self { size, successes }
    }

    /// Number of cells in row `row` (hit counts `0..=min(row + 1, successes)`).
    #[must_use]
    pub fn row_len(self, row: usize) -> usize {
        let sample = u32::try_from(row + 1).unwrap_or(u32::MAX);
        sample.min(self.successes) as usize + 1
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.successes, self.size)
    }
}

/// Categorical attributes identifying one accumulated distribution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BucketKey {
    pub analysis: Analysis,
    pub deck_size: u32,
    pub lands_in_deck: u32,
    pub best_of: BestOf,
    pub shuffling: ShufflingMode,
    pub population: Population,
}

impl BucketKey {
    /// Number of rows a distribution for this key has.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        if self.analysis.is_sequence() {
            self.population.size as usize
        } else {
            MAX_HAND_SIZE as usize
        }
    }

    /// Label of this key's value for `field`.
    #[must_use]
    pub fn label(&self, field: KeyField) -> String {
        match field {
            KeyField::Analysis => self.analysis.label(),
            KeyField::DeckSize => self.deck_size.to_string(),
            KeyField::Lands => self.lands_in_deck.to_string(),
            KeyField::BestOf => self.best_of.label().to_owned(),
            KeyField::Shuffling => self.shuffling.label().to_owned(),
            KeyField::Population => self.population.to_string(),
        }
    }

    /// Same key with a different match format.
    #[must_use]
    pub fn with_best_of(mut self, best_of: BestOf) -> Self {
        self.best_of = best_of;
        self
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} deck={} lands={} bo{} {} pop={}",
            self.analysis.label(),
            self.deck_size,
            self.lands_in_deck,
            self.best_of.label(),
            self.shuffling.label(),
            self.population
        )
    }
}

/// Field of a [`BucketKey`] that a stat tree can be nested by.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    Analysis,
    DeckSize,
    Lands,
    BestOf,
    Shuffling,
    Population,
}

impl KeyField {
    pub const ALL: [Self; 6] = [
        Self::DeckSize,
        Self::Lands,
        Self::BestOf,
        Self::Shuffling,
        Self::Analysis,
        Self::Population,
    ];
}
