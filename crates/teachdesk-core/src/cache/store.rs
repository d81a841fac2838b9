//! Durable string key-value storage behind the local cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Synchronous string-keyed store that survives restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// One `<key>.json` file per key inside a cache directory.
pub struct FileStore {
    cache_dir: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.cache_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        debug!(key = key, bytes = contents.len(), "Read cache entry");
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        std::fs::write(self.cache_path(key), value)?;
        debug!(key = key, bytes = value.len(), "Wrote cache entry");
        Ok(())
    }
}

/// In-memory store, for tests and runs that should leave nothing on disk.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a single entry.
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let store = Self::default();
        store.lock().insert(key.to_string(), value.into());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn temp_dir() -> PathBuf {
        let suffix: u64 = rand::thread_rng().gen();
        std::env::temp_dir().join(format!("teachdesk-cache-test-{:x}", suffix))
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = temp_dir();
        let store = FileStore::new(dir.clone()).unwrap();
        assert!(dir.exists());

        assert_eq!(store.get("teachers").unwrap(), None);
        store.set("teachers", "[]").unwrap();
        assert_eq!(store.get("teachers").unwrap().as_deref(), Some("[]"));
        assert!(dir.join("teachers.json").exists());

        // A second store over the same directory sees the entry.
        let reopened = FileStore::new(dir.clone()).unwrap();
        assert_eq!(reopened.get("teachers").unwrap().as_deref(), Some("[]"));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::with_entry("teachers", "[1]");
        assert_eq!(store.get("teachers").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get("positions").unwrap(), None);
        store.set("teachers", "[2]").unwrap();
        assert_eq!(store.get("teachers").unwrap().as_deref(), Some("[2]"));
    }
}
