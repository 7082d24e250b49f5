//! Durable key-value backends for conversation storage.
//!
//! The store only needs `get`/`put` of a single namespaced key, so backends
//! are deliberately small: [`FileStore`] for real use and [`MemoryStore`]
//! for tests and for simulating a process restart.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

/// Error type for persistence backends.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A durable key-value medium holding serialized values.
pub trait KeyValueStore {
    /// Read the value stored under `key`, or `None` if nothing was stored.
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Replace the value stored under `key`.
    fn put(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        (**self).put(key, value)
    }
}

/// File-backed store: one `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a `FileStore` rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the value files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        atomic_write(&path, value.as_bytes())?;
        Ok(())
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a raw value.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut values) = store.values.lock() {
            values.insert(key.into(), value.into());
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let values = self
            .values
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".into()))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PersistenceError::Unavailable("memory store lock poisoned".into()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Validate a storage key for filesystem safety.
fn validate_key(key: &str) -> Result<(), PersistenceError> {
    if key.is_empty() {
        return Err(PersistenceError::InvalidKey("key cannot be empty".to_string()));
    }

    if key.contains("..") {
        return Err(PersistenceError::InvalidKey(
            "key cannot contain path traversal".to_string(),
        ));
    }

    if let Some(ch) = key
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '-' && *ch != '_' && *ch != '.')
    {
        return Err(PersistenceError::InvalidKey(format!(
            "key contains invalid character: {ch}"
        )));
    }

    Ok(())
}

/// Write content atomically using temp file + fsync + rename.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let pid = std::process::id();

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("value");
    let tmp_path = path.with_file_name(format!("{file_name}.{timestamp}.{pid}.tmp"));

    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_file_store() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().join("store")).unwrap();
        (temp, store)
    }

    #[test]
    fn test_new_creates_directory() {
        let (temp, _store) = setup_file_store();
        assert!(temp.path().join("store").is_dir());
    }

    #[test]
    fn test_get_missing_key() {
        let (_temp, store) = setup_file_store();
        assert!(store.get("parley-conversations").unwrap().is_none());
    }

    #[test]
    fn test_put_then_get() {
        let (temp, store) = setup_file_store();
        store.put("parley-conversations", "[1,2,3]").unwrap();

        assert_eq!(
            store.get("parley-conversations").unwrap().as_deref(),
            Some("[1,2,3]")
        );
        assert!(temp
            .path()
            .join("store")
            .join("parley-conversations.json")
            .exists());
    }

    #[test]
    fn test_put_overwrites() {
        let (_temp, store) = setup_file_store();
        store.put("k", "first").unwrap();
        store.put("k", "second").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (_temp, store) = setup_file_store();
        store.put("k", "value").unwrap();

        for entry in fs::read_dir(store.dir()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.ends_with(".tmp"), "Found temp file: {name}");
        }
    }

    #[test]
    fn test_rejects_unsafe_keys() {
        let (_temp, store) = setup_file_store();
        assert!(matches!(store.get(""), Err(PersistenceError::InvalidKey(_))));
        assert!(matches!(
            store.put("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("a/b", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
        assert!(matches!(
            store.put("a\\b", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.put("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_store_with_value() {
        let store = MemoryStore::with_value("k", "seed");
        assert_eq!(store.get("k").unwrap().as_deref(), Some("seed"));
        assert!(store.get("other").unwrap().is_none());
    }

    #[test]
    fn test_boxed_backend_delegates() {
        let inner = MemoryStore::new();
        let boxed: Box<dyn KeyValueStore> = Box::new(inner.clone());
        boxed.put("k", "v").unwrap();
        assert_eq!(inner.get("k").unwrap().as_deref(), Some("v"));
    }
}
