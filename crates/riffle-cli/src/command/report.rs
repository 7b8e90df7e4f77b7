//! Scored table report
//!
//! Prints one table per bucket: a line per row with its games and composite
//! chance, then the count per hit value colored by how unlikely it is under
//! a random shuffle. Each row is followed by its expected counts.

use riffle_analysis::transform::{ScoredRow, TransformedRecord};
use riffle_stats::hypergeometric::hypergeometric_distribution;

use crate::{
    command::TreeArg,
    tint::{self, Direction},
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReportArg {
    #[clap(flatten)]
    tree: TreeArg,
    /// Only report analyses whose label starts with one of these (comma-separated)
    #[arg(long, value_delimiter = ',')]
    analysis: Vec<String>,
    /// Maximum number of rows printed per table
    #[arg(long, default_value_t = 10)]
    max_rows: usize,
    /// Show the strictly known counts instead of the extrapolated ones
    #[arg(long)]
    known_only: bool,
    /// Disable coloring
    #[arg(long)]
    no_color: bool,
}

pub(crate) fn run(arg: &ReportArg) -> anyhow::Result<()> {
    let store = util::load_store(&arg.tree.store)?;
    let tree = util::build_tree(
        &store,
        &arg.tree.group_by(),
        !arg.tree.no_best_of_combine,
    )?;

    println!("Shuffle Statistics Report");
    println!("=========================\n");
    print_legend();
    println!();

    let mut printed = 0;
    for (path, record) in tree.leaves() {
        let label = record.analysis.label();
        if !arg.analysis.is_empty() && !arg.analysis.iter().any(|a| label.starts_with(a.as_str()))
        {
            continue;
        }
        println!("{}", path.join(" / "));
        print_record(arg, record);
        println!();
        printed += 1;
    }
    if printed == 0 {
        println!("No data for the selected buckets yet.");
    }
    Ok(())
}

fn print_legend() {
    println!("Legend:");
    println!("  Chance: probability of a deviation at least this large under a random shuffle");
    println!(
        "  Colors: chances below {} are tinted, red above expectation, blue below",
        tint::NEUTRAL_ABOVE
    );
}

fn format_chance(chance: Option<f64>) -> String {
    chance.map_or("-".to_string(), |c| format!("{c:.3e}"))
}

fn print_record(arg: &ReportArg, record: &TransformedRecord) {
    let (view, rows) = match (&record.extrapolated, arg.known_only) {
        (Some(rows), false) => ("extrapolated", rows),
        _ => ("known", &record.known),
    };
    println!(
        "  {} games, chance {}, population {}, last game {} ({view})",
        record.num_games,
        format_chance(record.chance),
        record.population,
        record.date.format("%Y-%m-%d"),
    );

    let width = rows.iter().map(|row| row.counts.len()).max().unwrap_or(0);
    let header = (0..width).map(|hits| format!("{hits:>9}")).collect::<String>();
    println!("  {:>5} {:>9} {:>10} {header}", "Cards", "Games", "Chance");
    println!("  {}", "-".repeat(27 + 9 * width));

    for row in rows.iter().take(arg.max_rows) {
        print_row(arg, record, row);
    }
    if rows.len() > arg.max_rows {
        println!("  ... {} more rows", rows.len() - arg.max_rows);
    }
}

fn print_row(arg: &ReportArg, record: &TransformedRecord, row: &ScoredRow) {
    let games = row.num_games();
    let expected = hypergeometric_distribution(
        record.population.size,
        row.sample_size,
        record.population.successes,
    );
    let cells = row
        .counts
        .iter()
        .enumerate()
        .map(|(hits, cell)| {
            let text = format!("{:>9.1}", cell.count);
            if arg.no_color {
                return text;
            }
            let expected_count = games * expected.get(hits).copied().unwrap_or(0.0);
            tint::paint(
                text,
                tint::color(cell.chance, Direction::of(cell.count, expected_count)),
            )
        })
        .collect::<String>();
    println!(
        "  {:>5} {:>9.1} {:>10} {cells}",
        row.sample_size,
        games,
        format_chance(row.chance)
    );
    let expected_cells = (0..row.counts.len())
        .map(|hits| format!("{:>9.1}", games * expected.get(hits).copied().unwrap_or(0.0)))
        .collect::<String>();
    println!("  {:>5} {:>9} {:>10} {expected_cells}", "", "", "expected");
}
