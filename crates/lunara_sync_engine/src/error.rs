//! Error types for the sync engine.

use lunara_core::PracticeType;
use lunara_storage::StorageError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to callers of the engine's CRUD operations.
///
/// Only failures of the *local* write path appear here. Remote failures
/// are logged, leave the entry queued, and are observable through
/// [`crate::SyncStatus::pending_count`] staying above zero.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The referenced entry does not exist locally.
    #[error("no practice entry with id {0}")]
    NotFound(String),

    /// An update supplied content of a different practice kind than the
    /// entry it targets.
    #[error("practice kind mismatch: entry is {expected}, update is {got}")]
    PracticeTypeMismatch {
        /// Kind of the stored entry.
        expected: PracticeType,
        /// Kind of the supplied content.
        got: PracticeType,
    },

    /// The durable local store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Entries or queue could not be encoded for persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for remote store operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors produced by a [`crate::RemoteStore`] implementation.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Reading the remote collection failed.
    #[error("remote read failed: {0}")]
    Read(String),

    /// An upsert attempt failed.
    #[error("remote write failed: {0}")]
    Write(String),
}

impl RemoteError {
    /// Creates a read error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    /// Creates a write error.
    pub fn write(message: impl Into<String>) -> Self {
        Self::Write(message.into())
    }
}
