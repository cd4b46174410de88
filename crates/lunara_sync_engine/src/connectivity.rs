//! Connectivity signal.
//!
//! A small handle around a watch channel: the platform layer (or a test)
//! reports online/offline transitions through it, and the engine consumes
//! both the current flag and the transition stream.

use std::sync::Arc;
use tokio::sync::watch;

/// Reports whether the device is currently online.
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone)]
pub struct ConnectivitySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ConnectivitySignal {
    /// Creates a signal with the given initial state.
    #[must_use]
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        Self { tx: Arc::new(tx) }
    }

    /// Returns the current online flag.
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Reports a connectivity change.
    ///
    /// Setting the same value twice is harmless; watchers only observe
    /// actual changes.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
    }

    /// Subscribes to transition events.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ConnectivitySignal {
    fn default() -> Self {
        Self::new(false)
    }
}
