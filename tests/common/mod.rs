use catalog::storage::SqliteStorage;
use tempfile::TempDir;

/// A freshly migrated store in its own temp directory. Keep the directory
/// alive for as long as the store is used.
pub fn storage() -> (SqliteStorage, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let storage = SqliteStorage::new(dir.path().join("catalog.sqlite"));
    storage.init().expect("init storage");
    (storage, dir)
}
