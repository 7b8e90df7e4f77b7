//! Display transform of accumulated records
//!
//! Turns raw accumulated counts into rows of scored cells. Every row `i` is
//! scored against the hypergeometric expectation of drawing `i + 1` cards from
//! the bucket's population, with the row total as the number of games.
//!
//! 3D records carry two views: the strictly known counts and the
//! extrapolated counts from [`top_n`](crate::top_n). The record chance of a
//! 3D record only looks at the first [`EXTRAPOLATED_CHANCE_ROWS`]
//! extrapolated rows, where the extrapolated mass is still small.

use chrono::{DateTime, Utc};
use riffle_stats::{
    hypergeometric::hypergeometric_distribution_padded,
    significance::{self, ScoredCell},
};
use serde::{Deserialize, Serialize};

use crate::{
    distribution::CountPair,
    key::{Analysis, BucketKey, Population},
    record::AccumulatedRecord,
    top_n,
};

/// Number of leading extrapolated rows the record chance is composed over.
pub const EXTRAPOLATED_CHANCE_ROWS: usize = 10;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum TransformError {
    #[display("bucket {key} does not hold {expected}")]
    UnexpectedShape {
        #[error(not(source))]
        key: BucketKey,
        expected: &'static str,
    },
}

/// One count row annotated with significance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    /// Number of cards drawn for this row
    pub sample_size: u32,
    /// Composite chance of the row's cells
    pub chance: Option<f64>,
    pub counts: Vec<ScoredCell>,
}

impl ScoredRow {
    /// Scores `counts` as row `row` of a distribution over `population`.
    #[must_use]
    pub fn score(population: Population, row: usize, counts: &[f64]) -> Self {
        let sample_size = u32::try_from(row + 1).unwrap_or(u32::MAX);
        let expected = hypergeometric_distribution_padded(
            population.size,
            sample_size,
            population.successes,
            counts.len(),
        );
        let num_games = counts.iter().sum();
        let counts = significance::score_cells(num_games, counts, &expected);
        let chance = significance::composite(counts.iter().map(|cell| cell.chance));
        Self {
            sample_size,
            chance,
            counts,
        }
    }

    #[must_use]
    pub fn num_games(&self) -> f64 {
        self.counts.iter().map(|cell| cell.count).sum()
    }

    /// Raw counts of the row, without scores.
    #[must_use]
    pub fn raw_counts(&self) -> Vec<f64> {
        self.counts.iter().map(|cell| cell.count).collect()
    }
}

/// Display-ready form of one bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformedRecord {
    pub analysis: Analysis,
    pub population: Population,
    /// Newest contributing game
    pub date: DateTime<Utc>,
    pub num_games: u64,
    pub chance: Option<f64>,
    pub known: Vec<ScoredRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extrapolated: Option<Vec<ScoredRow>>,
}

impl TransformedRecord {
    /// Scores raw count rows.
    ///
    /// `extrapolated` is present for 3D analyses only. The number of games is
    /// the first row's total for sequence analyses and the total over all
    /// rows for hand analyses, where every game falls in exactly one row.
    ///
    /// ```
    /// use chrono::Utc;
    /// use riffle_analysis::{
    ///     key::{Analysis, DecklistEnd, Population},
    ///     transform::TransformedRecord,
    /// };
    ///
    /// let record = TransformedRecord::from_rows(
    ///     Analysis::DecklistPosition { end: DecklistEnd::Front },
    ///     Population::new(40, 1),
    ///     Utc::now(),
    ///     &[vec![39.0, 1.0], vec![38.0, 2.0]],
    ///     None,
    /// );
    /// assert_eq!(record.num_games, 40);
    /// assert_eq!(record.known[1].sample_size, 2);
    /// assert!(record.chance.is_some());
    /// ```
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn from_rows(
        analysis: Analysis,
        population: Population,
        date: DateTime<Utc>,
        known: &[Vec<f64>],
        extrapolated: Option<&[Vec<f64>]>,
    ) -> Self {
        let score_all = |rows: &[Vec<f64>]| {
            rows.iter()
                .enumerate()
                .map(|(row, counts)| ScoredRow::score(population, row, counts))
                .collect::<Vec<_>>()
        };
        let known = score_all(known);
        let extrapolated = extrapolated.map(score_all);

        let num_games = match &extrapolated {
            Some(rows) => rows.first().map_or(0.0, ScoredRow::num_games),
            None if analysis.is_sequence() => known.first().map_or(0.0, ScoredRow::num_games),
            None => known.iter().map(ScoredRow::num_games).sum(),
        };
        let chance = match &extrapolated {
            Some(rows) => significance::composite(
                rows.iter()
                    .take(EXTRAPOLATED_CHANCE_ROWS)
                    .map(|row| row.chance),
            ),
            None => significance::composite(known.iter().map(|row| row.chance)),
        };

        Self {
            analysis,
            population,
            date,
            num_games: num_games.round().max(0.0) as u64,
            chance,
            known,
            extrapolated,
        }
    }

    /// Transforms one accumulated record.
    #[expect(clippy::cast_precision_loss)]
    pub fn from_accumulated(record: &AccumulatedRecord) -> Result<Self, TransformError> {
        let key = record.key;
        if key.analysis.tracks_unknowns() {
            let rows = record.distribution.as_pair_rows().ok_or_else(|| {
                TransformError::UnexpectedShape {
                    key,
                    expected: "rows of count pairs",
                }
            })?;
            let top_n::Extrapolation {
                known,
                extrapolated,
            } = top_n::extrapolate(key.population, &rows);
            let mut transformed = Self::from_rows(
                key.analysis,
                key.population,
                record.date,
                &known,
                Some(extrapolated.as_slice()),
            );
            // Every game with library data, counted before extrapolation
            transformed.num_games = rows
                .first()
                .map_or(0, |row| row.iter().map(CountPair::total).sum());
            Ok(transformed)
        } else {
            let rows = record.distribution.as_rows().ok_or_else(|| {
                TransformError::UnexpectedShape {
                    key,
                    expected: "rows of counts",
                }
            })?;
            let known = rows
                .iter()
                .map(|row| row.iter().map(|&count| count as f64).collect())
                .collect::<Vec<_>>();
            Ok(Self::from_rows(
                key.analysis,
                key.population,
                record.date,
                &known,
                None,
            ))
        }
    }
}
