use std::path::PathBuf;

use riffle_analysis::tree::StatTree;

use crate::{command::TreeArg, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TransformArg {
    #[clap(flatten)]
    tree: TreeArg,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &TransformArg) -> anyhow::Result<()> {
    let store = util::load_store(&arg.tree.store)?;
    let tree: StatTree = util::build_tree(
        &store,
        &arg.tree.group_by(),
        !arg.tree.no_best_of_combine,
    )?;
    log::info!("Transformed {} buckets", store.len());
    util::emit_json(&tree, arg.output.as_deref())
}
