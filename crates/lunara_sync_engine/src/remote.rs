//! Remote store abstraction.
//!
//! The engine talks to the backend through [`RemoteStore`]: a per-user
//! document collection keyed by entry id, with JSON-document upsert
//! semantics. [`MockRemoteStore`] is the in-memory implementation used by
//! tests and examples; a production implementation wraps the actual
//! backend client. No timeout policy is applied here - wrap the
//! implementation if the transport can hang.

use crate::error::{RemoteError, RemoteResult};
use async_trait::async_trait;
use lunara_core::PracticeEntry;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// A remote document collection of practice entries, scoped per user.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches every entry stored for the user.
    async fn get_all(&self, user_id: &str) -> RemoteResult<Vec<PracticeEntry>>;

    /// Writes one entry, inserting or replacing by entry id.
    async fn upsert(&self, user_id: &str, entry: &PracticeEntry) -> RemoteResult<()>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn get_all(&self, user_id: &str) -> RemoteResult<Vec<PracticeEntry>> {
        (**self).get_all(user_id).await
    }

    async fn upsert(&self, user_id: &str, entry: &PracticeEntry) -> RemoteResult<()> {
        (**self).upsert(user_id, entry).await
    }
}

/// An in-memory remote store for testing.
///
/// Supports failure injection, call counting, and pausing writes so a
/// test can hold a sync pass in flight.
pub struct MockRemoteStore {
    docs: RwLock<HashMap<String, HashMap<String, PracticeEntry>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    get_all_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    paused: watch::Sender<bool>,
}

impl MockRemoteStore {
    /// Creates an empty mock store.
    #[must_use]
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            docs: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            get_all_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
            paused,
        }
    }

    /// Seeds an entry directly into the remote collection.
    pub fn seed_entry(&self, user_id: &str, entry: PracticeEntry) {
        self.docs
            .write()
            .entry(user_id.to_string())
            .or_default()
            .insert(entry.entry_id.clone(), entry);
    }

    /// Returns all entries stored for the user.
    #[must_use]
    pub fn entries_for(&self, user_id: &str) -> Vec<PracticeEntry> {
        self.docs
            .read()
            .get(user_id)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns one stored entry.
    #[must_use]
    pub fn entry(&self, user_id: &str, entry_id: &str) -> Option<PracticeEntry> {
        self.docs
            .read()
            .get(user_id)
            .and_then(|docs| docs.get(entry_id).cloned())
    }

    /// Makes every `get_all` fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every `upsert` fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Holds all upserts in flight until [`Self::resume_writes`].
    ///
    /// `send_replace` updates the flag even while nothing is waiting on
    /// it; plain `send` would drop the value without a receiver.
    pub fn pause_writes(&self) {
        self.paused.send_replace(true);
    }

    /// Releases upserts held by [`Self::pause_writes`].
    pub fn resume_writes(&self) {
        self.paused.send_replace(false);
    }

    /// Number of `get_all` calls received.
    #[must_use]
    pub fn get_all_calls(&self) -> usize {
        self.get_all_calls.load(Ordering::SeqCst)
    }

    /// Number of `upsert` calls received, including failed and in-flight
    /// ones.
    #[must_use]
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    async fn wait_until_resumed(&self) {
        let mut rx = self.paused.subscribe();
        while *rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn get_all(&self, user_id: &str) -> RemoteResult<Vec<PracticeEntry>> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RemoteError::read("injected read failure"));
        }
        Ok(self.entries_for(user_id))
    }

    async fn upsert(&self, user_id: &str, entry: &PracticeEntry) -> RemoteResult<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_until_resumed().await;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RemoteError::write("injected write failure"));
        }
        self.seed_entry(user_id, entry.clone());
        Ok(())
    }
}
