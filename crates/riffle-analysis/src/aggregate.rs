//! Incremental aggregation batch job
//!
//! One run of [`run_batch`] folds a window of new game records into a
//! [`DistributionStore`]. Runs are idempotent only at the level of the
//! store's high-water mark: records at or before the mark are ignored, every
//! newer record within the window is merged exactly once, and the mark then
//! advances to the newest processed date.
//!
//! The job is single-threaded and owns the store for the whole run.

use chrono::{DateTime, Utc};

use crate::{
    bucket::BatchDistributions,
    game::GameRecord,
    record::AccumulatedRecord,
    store::{DistributionStore, StoreError},
};

/// Default cap on the number of records fetched per batch.
pub const DEFAULT_MAX_RECORDS: usize = 2000;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Records offered to the job
    pub records_seen: usize,
    /// Records merged into the store
    pub processed: usize,
    /// Records at or before the high-water mark
    pub skipped_old: usize,
    /// Records newer than the mark but beyond the window cap
    pub deferred: usize,
    /// Malformed observations skipped during bucketing
    pub skipped_samples: usize,
    /// Buckets that received new counts
    pub buckets_touched: usize,
    /// Buckets seen for the first time
    pub buckets_created: usize,
    /// High-water mark after the run
    pub high_water_mark: Option<DateTime<Utc>>,
}

/// Number of leading records of the date-sorted `window` merged in one run.
///
/// A run never splits records sharing a timestamp: the next run only sees
/// records strictly newer than the mark. A tie group straddling the cap is
/// deferred whole, unless it starts the window, in which case it is taken
/// whole.
fn window_end(window: &[GameRecord], max_records: usize) -> usize {
    if window.len() <= max_records {
        return window.len();
    }
    if max_records == 0 {
        return 0;
    }
    let boundary = window[max_records].date;
    match window.partition_point(|record| record.date < boundary) {
        0 => window.partition_point(|record| record.date <= boundary),
        end => end,
    }
}

/// Merges the next window of `records` into `store`.
///
/// Only records strictly newer than the store's high-water mark are
/// considered. They are taken oldest first, at most `max_records` of them,
/// so records beyond the cap are picked up by the next run. Records sharing a
/// timestamp are never split across runs.
///
/// Every bucket is folded before any is written back: on error the store is
/// left untouched.
pub fn run_batch<S>(
    store: &mut S,
    records: &[GameRecord],
    max_records: usize,
) -> Result<BatchSummary, StoreError>
where
    S: DistributionStore + ?Sized,
{
    let mark = store.high_water_mark();
    let mut window = records
        .iter()
        .filter(|record| mark.is_none_or(|mark| record.date > mark))
        .cloned()
        .collect::<Vec<_>>();
    window.sort_by_key(|record| record.date);

    let mut summary = BatchSummary {
        records_seen: records.len(),
        skipped_old: records.len() - window.len(),
        ..BatchSummary::default()
    };
    let end = window_end(&window, max_records);
    summary.deferred = window.len() - end;
    window.truncate(end);
    summary.processed = window.len();

    let batch = BatchDistributions::collect(&window).map_err(StoreError::Merge)?;
    summary.skipped_samples = batch.skipped;

    let mut folded = Vec::with_capacity(batch.map.len());
    for (key, bucket) in batch.map {
        let existing = store.get(&key).cloned();
        if existing.is_none() {
            summary.buckets_created += 1;
        }
        log::debug!(
            "Merging {} games into {key} ({})",
            bucket.games,
            if existing.is_some() { "existing" } else { "new" }
        );
        let record = AccumulatedRecord::fold(existing, key, bucket.date, &bucket.distribution)
            .map_err(StoreError::Merge)?;
        folded.push(record);
    }
    summary.buckets_touched = folded.len();
    for record in folded {
        store.upsert(record);
    }

    if let Some(newest) = window.last() {
        store.advance_high_water_mark(newest.date);
    }
    summary.high_water_mark = store.high_water_mark();

    log::info!(
        "Batch merged {} of {} records into {} buckets ({} new, {} old records, {} deferred, {} malformed samples)",
        summary.processed,
        summary.records_seen,
        summary.buckets_touched,
        summary.buckets_created,
        summary.skipped_old,
        summary.deferred,
        summary.skipped_samples,
    );
    Ok(summary)
}
