//! Sync status observation.
//!
//! The engine publishes a [`SyncStatus`] snapshot whenever its observable
//! state changes (connectivity, sync-in-progress, queue depth, last sync
//! time). Subscribers receive the current snapshot synchronously at
//! subscription time, then every later change.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A snapshot of the engine's sync state.
///
/// Transient and derived; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    /// Whether the engine currently believes it is online.
    pub is_online: bool,
    /// Whether a sync pass is in flight.
    pub is_syncing: bool,
    /// Completion time of the last successful sync pass, if any.
    pub last_sync_time: Option<DateTime<Utc>>,
    /// Number of entries awaiting remote confirmation.
    pub pending_count: usize,
}

/// Distributes [`SyncStatus`] snapshots to subscribers.
///
/// Dropping a receiver unsubscribes it; disconnected subscribers are
/// pruned on the next emit.
pub struct StatusFeed {
    current: RwLock<SyncStatus>,
    subscribers: RwLock<Vec<Sender<SyncStatus>>>,
}

impl StatusFeed {
    /// Creates a feed with the given initial status.
    #[must_use]
    pub fn new(initial: SyncStatus) -> Self {
        Self {
            current: RwLock::new(initial),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Returns the most recently emitted status.
    #[must_use]
    pub fn current(&self) -> SyncStatus {
        self.current.read().clone()
    }

    /// Subscribes to the feed.
    ///
    /// The current status is delivered into the channel before this
    /// returns, so a new subscriber never starts blind.
    pub fn subscribe(&self) -> Receiver<SyncStatus> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.current());
        self.subscribers.write().push(tx);
        rx
    }

    /// Publishes a new status to all subscribers.
    pub fn emit(&self, status: SyncStatus) {
        *self.current.write() = status.clone();
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(status.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for StatusFeed {
    fn default() -> Self {
        Self::new(SyncStatus::default())
    }
}
