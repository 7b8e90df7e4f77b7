//! Storage abstraction for accumulated records
//!
//! The aggregation job needs little from its storage: get and upsert by
//! bucket key, plus a high-water mark recording the newest game date already
//! merged. [`DistributionStore`] captures exactly that. [`MemoryStore`] is a
//! `BTreeMap`-backed implementation that round-trips through a serializable
//! [`StoreSnapshot`].
//!
//! A store is a pure set of bucket keys; snapshots holding a key twice are
//! rejected when loaded.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{distribution::MergeError, key::BucketKey, record::AccumulatedRecord};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StoreError {
    #[display("bucket {key} appears more than once in the store")]
    DuplicateKey {
        #[error(not(source))]
        key: BucketKey,
    },
    #[display("failed to merge into stored bucket")]
    Merge(MergeError),
}

/// Keyed storage of accumulated records.
///
/// Implementations need no internal synchronization: a single batch job owns
/// the store for the duration of a run.
pub trait DistributionStore {
    fn get(&self, key: &BucketKey) -> Option<&AccumulatedRecord>;

    /// Inserts or replaces the record for `record.key`.
    fn upsert(&mut self, record: AccumulatedRecord);

    /// Newest game date already merged into the store.
    fn high_water_mark(&self) -> Option<DateTime<Utc>>;

    /// Moves the high-water mark forward. Earlier dates are ignored.
    fn advance_high_water_mark(&mut self, date: DateTime<Utc>);

    fn records(&self) -> Box<dyn Iterator<Item = &AccumulatedRecord> + '_>;
}

/// Serialized form of a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub high_water_mark: Option<DateTime<Utc>>,
    #[serde(default)]
    pub records: Vec<AccumulatedRecord>,
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    high_water_mark: Option<DateTime<Utc>>,
    records: BTreeMap<BucketKey, AccumulatedRecord>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut records = BTreeMap::new();
        for record in snapshot.records {
            let key = record.key;
            if records.insert(key, record).is_some() {
                return Err(StoreError::DuplicateKey { key });
            }
        }
        Ok(Self {
            high_water_mark: snapshot.high_water_mark,
            records,
        })
    }

    #[must_use]
    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            high_water_mark: self.high_water_mark,
            records: self.records.values().cloned().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DistributionStore for MemoryStore {
    fn get(&self, key: &BucketKey) -> Option<&AccumulatedRecord> {
        self.records.get(key)
    }

    fn upsert(&mut self, record: AccumulatedRecord) {
        self.records.insert(record.key, record);
    }

    fn high_water_mark(&self) -> Option<DateTime<Utc>> {
        self.high_water_mark
    }

    fn advance_high_water_mark(&mut self, date: DateTime<Utc>) {
        self.high_water_mark = Some(self.high_water_mark.map_or(date, |mark| mark.max(date)));
    }

    fn records(&self) -> Box<dyn Iterator<Item = &AccumulatedRecord> + '_> {
        Box::new(self.records.values())
    }
}
