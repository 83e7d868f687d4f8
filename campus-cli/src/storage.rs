use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Local key/value persistence for visitor state.
///
/// Values are opaque strings (JSON for structured entries). `set_many`
/// is all-or-nothing: after an error none of the entries are observable.
pub trait KeyValueStore {
    /// Read a value, `None` if the key was never written
    fn get(&self, key: &str) -> Option<String>;

    /// Write several entries as one atomic update
    fn set_many(&mut self, entries: &[(&str, String)]) -> StoreResult<()>;

    /// Write a single entry
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.set_many(&[(key, value.to_string())])
    }
}

/// File-backed store holding every key in one JSON document.
///
/// The document is read once when the store is opened. Each write
/// replaces the whole document through a temp file and a rename, so a
/// crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    file_path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    pub const FILE_NAME: &'static str = "store.json";

    /// Open the store in `dir`, creating nothing until the first write.
    pub fn open(dir: &Path) -> Self {
        let file_path = dir.join(Self::FILE_NAME);
        let entries = Self::read_document(&file_path);
        Self { file_path, entries }
    }

    /// A missing, unreadable or corrupt document reads as empty.
    fn read_document(path: &Path) -> HashMap<String, String> {
        if !path.exists() {
            return HashMap::new();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!(target: "storage", "Failed to read {}: {}", path.display(), e);
                return HashMap::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(entries) => {
                log::debug!(target: "storage", "Loaded local store from {}", path.display());
                entries
            }
            Err(e) => {
                log::warn!(target: "storage", "Local store {} is corrupted, starting empty: {}", path.display(), e);
                HashMap::new()
            }
        }
    }

    fn write_document(&self, entries: &HashMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(entries)?;
        let temp_path = self.file_path.with_extension("tmp");

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&temp_path, &self.file_path)?;
        Ok(())
    }

    /// Returns the path to the store document.
    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> StoreResult<()> {
        let mut next = self.entries.clone();
        for (key, value) in entries {
            next.insert(key.to_string(), value.clone());
        }

        self.write_document(&next)?;
        self.entries = next;
        log::debug!(target: "storage", "Persisted {} key(s) to {}", entries.len(), self.file_path.display());
        Ok(())
    }
}

/// In-process store for tests and `--ephemeral` runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail without touching the entries
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set_many(&mut self, entries: &[(&str, String)]) -> StoreResult<()> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        for (key, value) in entries {
            self.entries.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_round_trip_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path());
        assert_eq!(store.get("visitor_id"), None);

        store.set("visitor_id", "v_abc123").unwrap();
        store
            .set_many(&[("a", "1".to_string()), ("b", "2".to_string())])
            .unwrap();

        let reopened = FileStore::open(temp_dir.path());
        assert_eq!(reopened.get("visitor_id"), Some("v_abc123".to_string()));
        assert_eq!(reopened.get("a"), Some("1".to_string()));
        assert_eq!(reopened.get("b"), Some("2".to_string()));
    }

    #[test]
    fn test_corrupted_document_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(FileStore::FILE_NAME), "{not json").unwrap();

        let mut store = FileStore::open(temp_dir.path());
        assert_eq!(store.get("anything"), None);

        // The next write replaces the corrupt document
        store.set("k", "v").unwrap();
        assert_eq!(FileStore::open(temp_dir.path()).get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path());
        store.set("k", "v").unwrap();

        assert!(store.path().exists());
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_file_write_keeps_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path());
        store.set("k", "old").unwrap();

        // A directory where the temp file should go makes the write fail
        fs::create_dir(store.path().with_extension("tmp")).unwrap();
        assert!(store.set("k", "new").is_err());

        assert_eq!(store.get("k"), Some("old".to_string()));
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::open(temp_dir.path());
        store.set("k", "v").unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_memory_store_failure_is_all_or_nothing() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();

        store.set_fail_writes(true);
        let result = store.set_many(&[("a", "2".to_string()), ("b", "3".to_string())]);
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.get("a"), Some("1".to_string()));
        assert_eq!(store.get("b"), None);
    }
}
