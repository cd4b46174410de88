//! Local store trait definition.

use crate::error::StorageResult;

/// A durable local key-value store.
///
/// This is the persistence capability injected into the sync engine. The
/// engine serializes its entry map and pending queue to JSON strings and
/// writes them under two fixed keys; the store never interprets values.
///
/// # Invariants
///
/// - `get` returns exactly the value most recently passed to `set` for
///   that key, or `None` if the key was never written
/// - `set` is atomic per key: a reader never observes a torn value
/// - Stores must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing and ephemeral sessions
/// - [`super::FileStore`] - For persistent storage
pub trait LocalStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying medium cannot be read.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be made durable.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

impl<T: LocalStore + ?Sized> LocalStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }
}
