//! Grouping a batch of games into per-bucket sample distributions
//!
//! Each [`GameRecord`] contributes to several buckets: one per analysis it
//! carries observations for. Its contribution to a bucket is a small sample
//! distribution, and every sample for the same bucket key is folded together
//! with [`Distribution::merge_from`]. The result holds only the counts of the
//! new batch; folding it into history is done by
//! [`AccumulatedRecord::fold`](crate::record::AccumulatedRecord::fold).
//!
//! # Sequence samples
//!
//! For a known prefix of length `L > 0` with hit flags `f`, where analyses
//! without unknowns count every revealed position as known:
//!
//! - `known += 1` at `[p][hits(f[0..=p])]` for every `p < L - 1`
//! - at the last revealed position `L - 1`, `first_unknown += 1` when `L` is
//!   shorter than the library, `known += 1` otherwise
//!
//! An empty prefix carries no library data and yields no sample.
//! Hand samples add `1` at `[hand_size - 1][lands]`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
    distribution::{CountPair, Distribution, MergeError},
    game::GameRecord,
    key::{Analysis, BucketKey, MAX_HAND_SIZE, Population},
};

/// A sample that cannot be counted.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SampleError {
    #[display("revealed prefix of {revealed} cards is longer than the library of {size}")]
    PrefixTooLong { revealed: usize, size: u32 },
    #[display("{hits} tracked cards revealed but only {successes} exist")]
    TooManyHits { hits: u32, successes: u32 },
    #[display("{misses} untracked cards revealed but only {available} exist")]
    TooManyMisses { misses: u32, available: u32 },
    #[display("tracked population {successes} exceeds size {size}")]
    InvalidPopulation { size: u32, successes: u32 },
    #[display("hand size {hand_size} outside 1..=7")]
    HandSizeOutOfRange { hand_size: u32 },
}

/// New counts for one bucket key within a batch.
#[derive(Debug, Clone)]
pub struct BatchBucket {
    /// Newest game date contributing to this bucket
    pub date: DateTime<Utc>,
    /// Number of contributing games
    pub games: u64,
    pub distribution: Distribution,
}

/// Per-bucket sample distributions of one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchDistributions {
    pub map: BTreeMap<BucketKey, BatchBucket>,
    /// Number of observations skipped as malformed
    pub skipped: usize,
}

/// All-zero distribution with the full shape for `key`.
#[must_use]
pub fn zeros_for(key: &BucketKey) -> Distribution {
    let rows = key.num_rows();
    let population = key.population;
    if key.analysis.tracks_unknowns() {
        Distribution::from_pair_rows(
            (0..rows)
                .map(|row| vec![CountPair::default(); population.row_len(row)])
                .collect(),
        )
    } else {
        Distribution::from_rows(
            (0..rows)
                .map(|row| vec![0; population.row_len(row)])
                .collect(),
        )
    }
}

/// Sample distribution of one revealed library prefix.
///
/// Only rows up to the last revealed position are present; merging pads the
/// rest with zeros. Returns `None` for an empty prefix.
pub fn sequence_sample(
    population: Population,
    revealed: &[bool],
    tracks_unknowns: bool,
) -> Result<Option<Distribution>, SampleError> {
    let Population { size, successes } = population;
    if successes > size {
        return Err(SampleError::InvalidPopulation { size, successes });
    }
    if revealed.len() > size as usize {
        return Err(SampleError::PrefixTooLong {
            revealed: revealed.len(),
            size,
        });
    }
    let hits = u32::try_from(revealed.iter().filter(|&&hit| hit).count()).unwrap_or(u32::MAX);
    if hits > successes {
        return Err(SampleError::TooManyHits { hits, successes });
    }
    // Bounded by `size` above
    let misses = u32::try_from(revealed.len()).unwrap_or(u32::MAX) - hits;
    if misses > size - successes {
        return Err(SampleError::TooManyMisses {
            misses,
            available: size - successes,
        });
    }
    if revealed.is_empty() {
        return Ok(None);
    }

    // Hits through each revealed position
    let mut hits_so_far = 0;
    let known = revealed
        .iter()
        .map(|&hit| {
            hits_so_far += usize::from(hit);
            hits_so_far
        })
        .collect::<Vec<_>>();

    if !tracks_unknowns {
        let rows = known
            .iter()
            .enumerate()
            .map(|(position, &hits)| {
                let mut row = vec![0; population.row_len(position)];
                row[hits] = 1;
                row
            })
            .collect();
        return Ok(Some(Distribution::from_rows(rows)));
    }

    let last = known.len() - 1;
    let stopped = revealed.len() < size as usize;
    let rows = known
        .iter()
        .enumerate()
        .map(|(position, &hits)| {
            let mut row = vec![CountPair::default(); population.row_len(position)];
            if stopped && position == last {
                row[hits].first_unknown = 1;
            } else {
                row[hits].known = 1;
            }
            row
        })
        .collect();
    Ok(Some(Distribution::from_pair_rows(rows)))
}

/// Sample distribution of one opening hand.
pub fn hand_sample(
    population: Population,
    hand_size: u32,
    lands: u32,
) -> Result<Distribution, SampleError> {
    if hand_size == 0 || hand_size > MAX_HAND_SIZE {
        return Err(SampleError::HandSizeOutOfRange { hand_size });
    }
    if lands > population.successes.min(hand_size) {
        return Err(SampleError::TooManyHits {
            hits: lands,
            successes: population.successes.min(hand_size),
        });
    }
    let row = (hand_size - 1) as usize;
    let mut rows = vec![vec![]; row + 1];
    rows[row] = vec![0; population.row_len(row)];
    rows[row][lands as usize] = 1;
    Ok(Distribution::from_rows(rows))
}

/// Every bucket sample a game contributes, with malformed ones reported.
///
/// Sequence observations with nothing revealed contribute nothing.
#[must_use]
pub fn game_samples(record: &GameRecord) -> Vec<(BucketKey, Result<Distribution, SampleError>)> {
    let key_for = |analysis, population| BucketKey {
        analysis,
        deck_size: record.deck_size,
        lands_in_deck: record.lands_in_deck,
        best_of: record.best_of,
        shuffling: record.shuffling,
        population,
    };

    let mut samples = vec![];
    if let Some(hand) = &record.opening_hand {
        let population = Population::new(record.deck_size, record.lands_in_deck);
        samples.push((
            key_for(Analysis::HandLands, population),
            hand_sample(population, hand.hand_size, hand.lands),
        ));
    }
    let mut push_sequence =
        |analysis: Analysis, population: Population, revealed: &[bool], tracks_unknowns: bool| {
            if let Some(sample) = sequence_sample(population, revealed, tracks_unknowns).transpose()
            {
                samples.push((key_for(analysis, population), sample));
            }
        };
    if let Some(library) = &record.library {
        push_sequence(
            Analysis::LibraryLands,
            Population::new(library.size, library.lands),
            &library.revealed,
            true,
        );
    }
    for copy in &record.copies {
        push_sequence(
            Analysis::CopyPositions { copies: copy.copies },
            Population::new(copy.library_size, copy.copies),
            &copy.revealed,
            true,
        );
    }
    for decklist in &record.decklist {
        push_sequence(
            Analysis::DecklistPosition { end: decklist.end },
            Population::new(decklist.library_size, decklist.num_cards),
            &decklist.revealed,
            false,
        );
    }
    samples
}

impl BatchDistributions {
    /// Groups the samples of `records` by bucket key.
    ///
    /// Malformed observations are skipped and counted in
    /// [`skipped`](Self::skipped); the rest of the record still counts.
    pub fn collect(records: &[GameRecord]) -> Result<Self, MergeError> {
        let mut batch = Self::default();
        for record in records {
            for (key, sample) in game_samples(record) {
                match sample {
                    Ok(sample) => batch.add(key, record.date, &sample)?,
                    Err(err) => {
                        log::warn!("Skipping {key} sample from game at {}: {err}", record.date);
                        batch.skipped += 1;
                    }
                }
            }
        }
        Ok(batch)
    }

    fn add(
        &mut self,
        key: BucketKey,
        date: DateTime<Utc>,
        sample: &Distribution,
    ) -> Result<(), MergeError> {
        let bucket = self.map.entry(key).or_insert_with(|| BatchBucket {
            date,
            games: 0,
            distribution: zeros_for(&key),
        });
        bucket.distribution.merge_from(sample)?;
        bucket.date = bucket.date.max(date);
        bucket.games += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::{
        game::{HandObservation, LibraryObservation},
        key::{BestOf, ShufflingMode},
    };

    fn record(day: u32, revealed: Vec<bool>) -> GameRecord {
        GameRecord {
            date: Utc.with_ymd_and_hms(2026, 8, day, 12, 0, 0).unwrap(),
            deck_size: 40,
            lands_in_deck: 17,
            best_of: BestOf::One,
            shuffling: ShufflingMode::Standard,
            opening_hand: Some(HandObservation {
                hand_size: 7,
                lands: 3,
            }),
            library: Some(LibraryObservation {
                size: 33,
                lands: 14,
                revealed,
            }),
            copies: vec![],
            decklist: vec![],
        }
    }

    #[test]
    fn test_sequence_sample_with_unknown() {
        let population = Population::new(5, 2);
        let sample = sequence_sample(population, &[true, false], true)
            .unwrap()
            .unwrap();
        let rows = sample.as_pair_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], CountPair::new(1, 0));
        // Last revealed card, with the next one unknown
        assert_eq!(rows[1][1], CountPair::new(0, 1));
        assert_eq!(sample.total(), 2);
    }

    #[test]
    fn test_sequence_sample_fully_revealed() {
        let population = Population::new(3, 1);
        let sample = sequence_sample(population, &[false, false, true], true)
            .unwrap()
            .unwrap();
        let rows = sample.as_pair_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][1], CountPair::new(1, 0));
        assert_eq!(sample.total(), 3);
    }

    #[test]
    fn test_sequence_sample_without_unknowns() {
        let population = Population::new(10, 3);
        let sample = sequence_sample(population, &[true], false).unwrap().unwrap();
        assert_eq!(sample.as_rows(), Some(vec![vec![0, 1]]));
    }

    #[test]
    fn test_nothing_revealed() {
        assert_eq!(sequence_sample(Population::new(10, 3), &[], true), Ok(None));

        let mut record = record(1, vec![]);
        record.opening_hand = None;
        assert!(game_samples(&record).is_empty());
    }

    #[test]
    fn test_malformed_samples() {
        let population = Population::new(3, 1);
        assert_eq!(
            sequence_sample(population, &[true, true], true),
            Err(SampleError::TooManyHits {
                hits: 2,
                successes: 1
            })
        );
        assert!(matches!(
            sequence_sample(population, &[false; 4], true),
            Err(SampleError::PrefixTooLong { .. })
        ));
        assert!(matches!(
            sequence_sample(population, &[false, false, false], true),
            Err(SampleError::TooManyMisses { .. })
        ));
        assert!(matches!(
            hand_sample(population, 8, 0),
            Err(SampleError::HandSizeOutOfRange { hand_size: 8 })
        ));
    }

    #[test]
    fn test_hand_sample() {
        let sample = hand_sample(Population::new(40, 17), 2, 1).unwrap();
        assert_eq!(sample.as_rows(), Some(vec![vec![], vec![0, 1, 0]]));
    }

    #[test]
    fn test_collect_groups_by_key() {
        let records = [
            record(1, vec![true]),
            record(3, vec![false, true]),
            record(2, vec![true; 15]),
        ];
        let batch = BatchDistributions::collect(&records).unwrap();
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.map.len(), 2);

        let (key, library) = batch
            .map
            .iter()
            .find(|(key, _)| key.analysis == Analysis::LibraryLands)
            .unwrap();
        assert_eq!(library.games, 2);
        assert_eq!(library.date, records[1].date);

        let rows = library.distribution.as_pair_rows().unwrap();
        assert_eq!(rows.len(), key.num_rows());
        assert_eq!(rows[0][1], CountPair::new(0, 1));
        assert_eq!(rows[0][0], CountPair::new(1, 0));
        assert_eq!(rows[1][1], CountPair::new(0, 1));

        let hand = batch
            .map
            .values()
            .find(|bucket| bucket.games == 3)
            .unwrap();
        assert_eq!(hand.distribution.as_rows().unwrap()[6][3], 3);
    }
}
