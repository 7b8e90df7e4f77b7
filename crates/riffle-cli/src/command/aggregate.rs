use std::path::PathBuf;

use riffle_analysis::aggregate::{self, DEFAULT_MAX_RECORDS};

use crate::util;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AggregateArg {
    /// Path to the game records JSON file
    pub records: PathBuf,
    /// Path to the accumulated store JSON file, created if missing
    #[arg(long)]
    pub store: PathBuf,
    /// Maximum number of records merged in one batch
    #[arg(long, default_value_t = DEFAULT_MAX_RECORDS)]
    pub max_records: usize,
    /// Run the batch without writing the store back
    #[arg(long)]
    pub dry_run: bool,
}

pub(crate) fn run(arg: &AggregateArg) -> anyhow::Result<()> {
    let records = util::read_records_file(&arg.records)?;
    let mut store = util::load_store(&arg.store)?;

    let summary = aggregate::run_batch(&mut store, &records, arg.max_records)?;

    println!("Aggregation Summary");
    println!("===================");
    println!("  Records seen:      {}", summary.records_seen);
    println!("  Merged:            {}", summary.processed);
    println!("  Already merged:    {}", summary.skipped_old);
    println!("  Deferred (cap):    {}", summary.deferred);
    println!("  Malformed samples: {}", summary.skipped_samples);
    println!(
        "  Buckets:           {} touched, {} new, {} total",
        summary.buckets_touched,
        summary.buckets_created,
        store.len()
    );
    match summary.high_water_mark {
        Some(mark) => println!("  High-water mark:   {}", mark.to_rfc3339()),
        None => println!("  High-water mark:   none"),
    }
    if summary.deferred > 0 {
        println!("\nRun again to merge the remaining {} records.", summary.deferred);
    }

    if arg.dry_run {
        log::info!("Dry run, leaving {} untouched", arg.store.display());
        return Ok(());
    }
    util::save_store(&arg.store, &store)
}
