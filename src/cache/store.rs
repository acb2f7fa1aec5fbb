//! Persistent key-value store
//!
//! A string-keyed, string-valued store with synchronous get/set/remove and no
//! expiry of its own. `FileStore` keeps one `<key>.json` file per key in an
//! XDG-compliant cache directory (`~/.cache/cryptovisual/v<N>/` on Linux).
//! `MemoryStore` backs tests and the `--offline` mode when no cache directory
//! can be determined.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use super::key::CacheKey;

/// Current on-disk namespace version. Bump to discard every older cache.
pub const STORE_VERSION: u32 = 2;

/// File written into every version directory this store creates. Only
/// directories carrying it are ever migrated or deleted.
pub const STORE_MARKER: &str = ".cryptovisual-store";

/// Errors that can occur when writing to a store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed
    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized
    #[error("failed to serialize cache value: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String-keyed persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored text for `key`, if any
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`; missing keys are ignored
    fn remove(&self, key: &str);

    /// Removes every key starting with `prefix`
    fn remove_prefix(&self, prefix: &str);
}

/// Stores each key as a JSON file inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where entry files are stored
    dir: PathBuf,
}

impl FileStore {
    /// Opens the versioned store under the XDG cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let root = default_cache_root()?;
        Some(Self::open_versioned(&root, STORE_VERSION))
    }

    /// Creates a store rooted directly at `dir`
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Activates `root/v<version>` and removes directories left by older versions
    ///
    /// Only sibling `v<N>` directories holding [`STORE_MARKER`] count as older
    /// versions; anything else under `root` is left alone. The holdings record
    /// is carried forward from the newest older version that has one, unless
    /// the active version already holds it.
    pub fn open_versioned(root: &Path, version: u32) -> Self {
        let store = Self::with_dir(root.join(format!("v{}", version)));
        if let Err(e) = store.write_marker() {
            warn!(version, error = %e, "failed to mark cache directory");
        }
        let portfolio_file = format!("{}.json", CacheKey::Portfolio.as_store_key());

        let mut stale: Vec<(u32, PathBuf)> = fs::read_dir(root)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join(STORE_MARKER).is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                let found = name.strip_prefix('v')?.parse::<u32>().ok()?;
                (found != version).then(|| (found, entry.path()))
            })
            .collect();
        stale.sort_by(|a, b| b.0.cmp(&a.0));

        for (old_version, path) in stale {
            let carried = path.join(&portfolio_file);
            if carried.exists() && !store.path_for_file(&portfolio_file).exists() {
                match store
                    .ensure_dir()
                    .and_then(|_| fs::copy(&carried, store.path_for_file(&portfolio_file)))
                {
                    Ok(_) => info!(old_version, "carried portfolio forward from old cache"),
                    Err(e) => warn!(old_version, error = %e, "failed to carry portfolio forward"),
                }
            }
            match fs::remove_dir_all(&path) {
                Ok(()) => info!(old_version, "removed stale cache version"),
                Err(e) => warn!(old_version, error = %e, "failed to remove stale cache version"),
            }
        }

        store
    }

    /// Directory holding the entry files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the path to the file for the given key
    fn path_for(&self, key: &str) -> PathBuf {
        self.path_for_file(&format!("{}.json", key))
    }

    fn path_for_file(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Ensures the store directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    fn write_marker(&self) -> std::io::Result<()> {
        self.ensure_dir()?;
        fs::write(self.dir.join(STORE_MARKER), env!("CARGO_PKG_VERSION"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_dir()?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.path_for(key));
    }

    fn remove_prefix(&self, prefix: &str) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.filter_map(|entry| entry.ok()) {
            let name = entry.file_name().to_string_lossy().into_owned();
            let matches = name
                .strip_suffix(".json")
                .is_some_and(|key| key.starts_with(prefix));
            if matches {
                let _ = fs::remove_file(entry.path());
            }
        }
    }
}

/// In-process store, lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn remove_prefix(&self, prefix: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|key, _| !key.starts_with(prefix));
        }
    }
}

/// Unversioned cache root, e.g. `~/.cache/cryptovisual`
pub fn default_cache_root() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "cryptovisual")?;
    Some(project_dirs.cache_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_store_directory() {
        let (store, temp_dir) = create_test_store();

        store.set("top_assets_usd", "{\"data\":[]}").expect("Write should succeed");

        let expected_path = temp_dir.path().join("top_assets_usd.json");
        assert!(expected_path.exists(), "Entry file should exist");
        assert_eq!(fs::read_to_string(expected_path).unwrap(), "{\"data\":[]}");
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get("nonexistent_key").is_none());
    }

    #[test]
    fn test_set_then_get_returns_value() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", "value").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("value"));
    }

    #[test]
    fn test_overwrite_existing_value() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("second"));
    }

    #[test]
    fn test_remove_deletes_value_and_ignores_missing() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", "v").unwrap();
        store.remove("k");
        store.remove("never_written");
        assert!(store.get("k").is_none());
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("store");
        let store = FileStore::with_dir(nested.clone());

        store.set("k", "v").expect("Write should succeed");

        assert!(nested.join("k.json").exists());
    }

    #[test]
    fn test_open_versioned_removes_older_versions() {
        let temp_dir = TempDir::new().unwrap();
        let old = FileStore::open_versioned(temp_dir.path(), 1);
        old.set("top_assets_usd", "old").unwrap();

        let store = FileStore::open_versioned(temp_dir.path(), 2);

        assert!(!temp_dir.path().join("v1").exists(), "old version should be removed");
        assert_eq!(store.dir(), temp_dir.path().join("v2"));
        assert!(store.get("top_assets_usd").is_none());
    }

    #[test]
    fn test_open_versioned_carries_portfolio_forward() {
        let temp_dir = TempDir::new().unwrap();
        let old = FileStore::open_versioned(temp_dir.path(), 1);
        old.set("my_portfolio", "{\"bitcoin\":0.5}").unwrap();
        old.set("market_page_usd_1", "stale").unwrap();

        let store = FileStore::open_versioned(temp_dir.path(), 2);

        assert_eq!(store.get("my_portfolio").as_deref(), Some("{\"bitcoin\":0.5}"));
        assert!(store.get("market_page_usd_1").is_none());
    }

    #[test]
    fn test_open_versioned_keeps_current_and_unrelated_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let old = FileStore::open_versioned(temp_dir.path(), 1);
        old.set("my_portfolio", "{\"bitcoin\":9.0}").unwrap();
        let current = FileStore::with_dir(temp_dir.path().join("v2"));
        current.set("my_portfolio", "{\"solana\":1.0}").unwrap();
        fs::create_dir_all(temp_dir.path().join("logs")).unwrap();

        let store = FileStore::open_versioned(temp_dir.path(), 2);

        assert_eq!(store.get("my_portfolio").as_deref(), Some("{\"solana\":1.0}"));
        assert!(temp_dir.path().join("logs").exists());
        assert!(!temp_dir.path().join("v1").exists());
    }

    #[test]
    fn test_open_versioned_leaves_unmarked_version_dirs_alone() {
        let temp_dir = TempDir::new().unwrap();
        let user_dir = temp_dir.path().join("v1");
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(user_dir.join("thesis.tex"), "\\documentclass{article}").unwrap();
        fs::write(user_dir.join("my_portfolio.json"), "{\"bitcoin\":100.0}").unwrap();

        let store = FileStore::open_versioned(temp_dir.path(), STORE_VERSION);

        assert!(user_dir.join("thesis.tex").exists());
        assert!(user_dir.join("my_portfolio.json").exists());
        assert!(store.get("my_portfolio").is_none());
        assert!(store.dir().join(STORE_MARKER).is_file());
    }

    #[test]
    fn test_remove_prefix_only_touches_matching_keys() {
        let (store, _temp_dir) = create_test_store();
        store.set("simple_prices_usd_bitcoin", "1").unwrap();
        store.set("simple_prices_usd_bitcoin,solana", "2").unwrap();
        store.set("simple_prices_idr_bitcoin", "3").unwrap();
        store.set("top_assets_usd", "4").unwrap();

        store.remove_prefix("simple_prices_usd_");

        assert!(store.get("simple_prices_usd_bitcoin").is_none());
        assert!(store.get("simple_prices_usd_bitcoin,solana").is_none());
        assert_eq!(store.get("simple_prices_idr_bitcoin").as_deref(), Some("3"));
        assert_eq!(store.get("top_assets_usd").as_deref(), Some("4"));

        let memory = MemoryStore::new();
        memory.set("simple_prices_usd_bitcoin", "1").unwrap();
        memory.set("top_assets_usd", "4").unwrap();
        memory.remove_prefix("simple_prices_usd_");
        assert_eq!(memory.len(), 1);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        assert_eq!(store.len(), 1);
        store.remove("a");
        assert!(store.get("a").is_none());
    }

    #[test]
    fn test_default_cache_root_names_project() {
        if let Some(root) = default_cache_root() {
            assert!(root.to_string_lossy().contains("cryptovisual"));
        }
        // Passes when no home directory is available (e.g. CI)
    }
}
