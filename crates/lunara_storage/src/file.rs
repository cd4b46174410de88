//! File-backed store for persistent sessions.

use crate::error::{StorageError, StorageResult};
use crate::store::LocalStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A file-backed key-value store.
///
/// The whole map is held in memory and persisted as a single JSON object
/// on every `set`. Writes go to a sibling temp file which is then renamed
/// over the target, so a crash mid-write leaves the previous file intact.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across tasks. Writes are
/// serialized by an internal lock.
///
/// # Example
///
/// ```no_run
/// use lunara_storage::{FileStore, LocalStore};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("session.json")).unwrap();
/// store.set("key", "value").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Opens or creates a file store at the given path.
    ///
    /// If the file exists its contents are loaded; otherwise the store
    /// starts empty and the file is created on the first `set`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or exists but does
    /// not contain a JSON object of strings.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let values = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw)
                .map_err(|e| StorageError::Corrupted(format!("{}: {e}", path.display())))?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            values: RwLock::new(values),
        })
    }

    /// Opens or creates a file store, creating parent directories if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file
    /// cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current map to disk via a temp file and rename.
    fn persist(&self, values: &HashMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string(values)
            .map_err(|e| StorageError::Corrupted(e.to_string()))?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }
}
