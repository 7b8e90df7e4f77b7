//! Accumulated per-bucket records
//!
//! An [`AccumulatedRecord`] is created the first time a bucket key is seen and
//! is read-merged-written on every later batch that contributes to it. It is
//! never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    distribution::{Distribution, MergeError},
    key::BucketKey,
};

/// Accumulated distribution for one bucket key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatedRecord {
    pub key: BucketKey,
    /// Newest date of any contributing game
    pub date: DateTime<Utc>,
    pub distribution: Distribution,
}

impl AccumulatedRecord {
    /// Folds one batch of new counts into the existing record for `key`.
    ///
    /// When `existing` is `None` the batch becomes the record. The resulting
    /// date is the newer of the two. Must be called exactly once per batch:
    /// merging is additive, not idempotent.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone as _, Utc};
    /// use riffle_analysis::{
    ///     distribution::Distribution,
    ///     key::{Analysis, BestOf, BucketKey, Population, ShufflingMode},
    ///     record::AccumulatedRecord,
    /// };
    ///
    /// let key = BucketKey {
    ///     analysis: Analysis::HandLands,
    ///     deck_size: 60,
    ///     lands_in_deck: 24,
    ///     best_of: BestOf::Three,
    ///     shuffling: ShufflingMode::Standard,
    ///     population: Population::new(60, 24),
    /// };
    /// let day1 = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
    /// let day2 = Utc.with_ymd_and_hms(2026, 8, 2, 0, 0, 0).unwrap();
    ///
    /// let first = AccumulatedRecord::fold(None, key, day2, &Distribution::from_rows(vec![vec![1, 2]]))?;
    /// let second = AccumulatedRecord::fold(Some(first), key, day1, &Distribution::from_rows(vec![vec![3, 4]]))?;
    /// assert_eq!(second.date, day2);
    /// assert_eq!(second.distribution, Distribution::from_rows(vec![vec![4, 6]]));
    /// # Ok::<(), riffle_analysis::distribution::MergeError>(())
    /// ```
    pub fn fold(
        existing: Option<Self>,
        key: BucketKey,
        batch_date: DateTime<Utc>,
        batch: &Distribution,
    ) -> Result<Self, MergeError> {
        match existing {
            Some(mut record) => {
                debug_assert_eq!(record.key, key, "folding a batch into a different bucket");
                record.distribution.merge_from(batch)?;
                record.date = record.date.max(batch_date);
                Ok(record)
            }
            None => Ok(Self {
                key,
                date: batch_date,
                distribution: batch.clone(),
            }),
        }
    }
}
