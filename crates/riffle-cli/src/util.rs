use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use riffle_analysis::{
    best_of,
    game::GameRecord,
    key::KeyField,
    store::{DistributionStore as _, MemoryStore, StoreSnapshot},
    tree::StatTree,
};

/// Pretty-print `value` as JSON to `path`, or to stdout when no path is given
pub fn emit_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize + ?Sized,
{
    match path {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("Cannot create {}", path.display()))?;
            pretty_json(BufWriter::new(file), value)
                .with_context(|| format!("Cannot write JSON to {}", path.display()))
        }
        None => pretty_json(io::stdout().lock(), value).context("Cannot write JSON to stdout"),
    }
}

fn pretty_json<W, T>(mut writer: W, value: &T) -> io::Result<()>
where
    W: Write,
    T: serde::Serialize + ?Sized,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Replace the store file with `store`.
///
/// The snapshot goes to a sibling `.tmp` file first and is renamed over the
/// old store. An interrupted write leaves the previous store in place.
pub fn save_store(path: &Path, store: &MemoryStore) -> anyhow::Result<()> {
    let staging = staging_path(path);
    emit_json(&store.to_snapshot(), Some(staging.as_path()))?;
    fs::rename(&staging, path).with_context(|| {
        format!(
            "Cannot move {} over {}",
            staging.display(),
            path.display()
        )
    })?;
    log::info!("Saved {} buckets to {}", store.len(), path.display());
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn parse_json_file<T>(what: &str, path: &Path) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let text =
        fs::read_to_string(path).with_context(|| format!("Cannot read {what} {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Malformed {what} in {}", path.display()))
}

/// Read per-game records from a JSON array file
pub fn read_records_file<P>(path: P) -> anyhow::Result<Vec<GameRecord>>
where
    P: AsRef<Path>,
{
    parse_json_file("game records", path.as_ref())
}

/// Load the accumulated store, or an empty one when the file does not exist yet
pub fn load_store<P>(path: P) -> anyhow::Result<MemoryStore>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        log::info!("Store {} not found, starting empty", path.display());
        return Ok(MemoryStore::new());
    }
    let snapshot: StoreSnapshot = parse_json_file("store", path)?;
    let store = MemoryStore::from_snapshot(snapshot)
        .with_context(|| format!("Invalid store file: {}", path.display()))?;
    log::debug!("Loaded {} buckets from {}", store.len(), path.display());
    Ok(store)
}

/// Transform every bucket of a store into a grouped tree
pub fn build_tree(
    store: &MemoryStore,
    group_by: &[KeyField],
    combine_best_of: bool,
) -> anyhow::Result<StatTree> {
    let mut tree =
        StatTree::build(store.records(), group_by).context("Failed to transform store")?;
    if combine_best_of {
        best_of::insert_combined(&mut tree).context("Failed to combine best-of formats")?;
    }
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use riffle_analysis::{
        aggregate,
        game::LibraryObservation,
        key::{BestOf, ShufflingMode},
    };

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("riffle-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_staging_path_is_sibling() {
        assert_eq!(
            staging_path(Path::new("data/store.json")),
            Path::new("data/store.json.tmp")
        );
    }

    #[test]
    fn test_missing_store_starts_empty() {
        let dir = scratch_dir("missing");
        let store = load_store(dir.join("absent.json")).unwrap();
        assert!(store.is_empty());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_saved_store_loads_back() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("store.json");
        let mut store = MemoryStore::new();
        let record = GameRecord {
            date: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
            deck_size: 40,
            lands_in_deck: 17,
            best_of: BestOf::One,
            shuffling: ShufflingMode::Smoothed,
            opening_hand: None,
            library: Some(LibraryObservation {
                size: 33,
                lands: 14,
                revealed: vec![true, false],
            }),
            copies: vec![],
            decklist: vec![],
        };
        aggregate::run_batch(&mut store, &[record], aggregate::DEFAULT_MAX_RECORDS).unwrap();

        save_store(&path, &store).unwrap();
        assert!(!staging_path(&path).exists());
        let loaded = load_store(&path).unwrap();
        assert_eq!(loaded.len(), store.len());
        assert_eq!(
            serde_json::to_value(loaded.to_snapshot()).unwrap(),
            serde_json::to_value(store.to_snapshot()).unwrap()
        );
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_malformed_store_is_an_error() {
        let dir = scratch_dir("malformed");
        let path = dir.join("store.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_store(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Malformed store"));
        fs::remove_dir_all(dir).unwrap();
    }
}
