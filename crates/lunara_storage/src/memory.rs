//! In-memory store for testing and ephemeral sessions.

use crate::error::StorageResult;
use crate::store::LocalStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory key-value store.
///
/// Values live only as long as the process; suitable for unit tests,
/// integration tests, and sessions that do not need persistence.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across tasks.
///
/// # Example
///
/// ```rust
/// use lunara_storage::{InMemoryStore, LocalStore};
///
/// let store = InMemoryStore::new();
/// store.set("k", "v").unwrap();
/// assert_eq!(store.get("k").unwrap(), Some("v".to_string()));
/// assert_eq!(store.get("missing").unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with values.
    ///
    /// Useful for testing load and recovery paths.
    #[must_use]
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Removes all stored values.
    pub fn clear(&self) {
        self.values.write().clear();
    }
}

impl LocalStore for InMemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
