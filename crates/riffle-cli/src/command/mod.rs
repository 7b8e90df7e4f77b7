use clap::{Parser, Subcommand, ValueEnum};
use riffle_analysis::key::KeyField;

use self::{
    aggregate::AggregateArg, report::ReportArg, simulate::SimulateArg, transform::TransformArg,
};

mod aggregate;
mod report;
mod simulate;
mod transform;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Merge new game records into the accumulated store
    Aggregate(#[clap(flatten)] AggregateArg),
    /// Write the scored statistics tree as JSON
    Transform(#[clap(flatten)] TransformArg),
    /// Print scored tables for every bucket
    Report(#[clap(flatten)] ReportArg),
    /// Generate game records from truly random shuffles
    Simulate(#[clap(flatten)] SimulateArg),
}

/// Bucket key field to group the statistics tree by
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum GroupField {
    DeckSize,
    Lands,
    BestOf,
    Shuffling,
    Analysis,
    Population,
}

impl From<GroupField> for KeyField {
    fn from(field: GroupField) -> Self {
        match field {
            GroupField::DeckSize => KeyField::DeckSize,
            GroupField::Lands => KeyField::Lands,
            GroupField::BestOf => KeyField::BestOf,
            GroupField::Shuffling => KeyField::Shuffling,
            GroupField::Analysis => KeyField::Analysis,
            GroupField::Population => KeyField::Population,
        }
    }
}

/// Options shared by the commands that read the store for display
#[derive(Debug, Clone, clap::Args)]
struct TreeArg {
    /// Path to the accumulated store JSON file
    #[arg(long)]
    store: std::path::PathBuf,
    /// Nesting order of the statistics tree (comma-separated)
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values = ["deck-size", "lands", "best-of", "shuffling", "analysis"]
    )]
    group_by: Vec<GroupField>,
    /// Do not add the combined "all" best-of view
    #[arg(long)]
    no_best_of_combine: bool,
}

impl TreeArg {
    fn group_by(&self) -> Vec<KeyField> {
        self.group_by.iter().copied().map(KeyField::from).collect()
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Aggregate(arg) => aggregate::run(&arg)?,
        Mode::Transform(arg) => transform::run(&arg)?,
        Mode::Report(arg) => report::run(&arg)?,
        Mode::Simulate(arg) => simulate::run(&arg)?,
    }
    Ok(())
}
