//! The practice sync engine.

use crate::config::SyncConfig;
use crate::connectivity::ConnectivitySignal;
use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteStore;
use crate::status::{StatusFeed, SyncStatus};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use lunara_core::{PracticeContent, PracticeEntry, PracticeType};
use lunara_storage::LocalStore;
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Offline-first manager for one user's practice entries.
///
/// Every CRUD call persists to the local store before any network
/// activity; remote sync is best-effort and eventually consistent. One
/// engine is constructed per authenticated session and passed by handle -
/// cloning is cheap and all clones share state.
///
/// # Local-write authority
///
/// `create_entry` / `update_entry` / `delete_entry` only fail if the
/// *local* write is invalid or the local store errors. Remote failures
/// are logged and leave the entry queued; they surface only as
/// [`SyncStatus::pending_count`] staying above zero.
pub struct PracticeSyncEngine<L, R> {
    inner: Arc<EngineInner<L, R>>,
}

impl<L, R> Clone for PracticeSyncEngine<L, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<L, R> {
    config: SyncConfig,
    local: L,
    remote: R,
    entries: RwLock<HashMap<String, PracticeEntry>>,
    queue: RwLock<Vec<String>>,
    online: AtomicBool,
    syncing: AtomicBool,
    last_sync: RwLock<Option<DateTime<Utc>>>,
    status: StatusFeed,
    rng: Mutex<StdRng>,
}

impl<L, R> PracticeSyncEngine<L, R>
where
    L: LocalStore + 'static,
    R: RemoteStore + 'static,
{
    /// Opens an engine over the given stores, loading any persisted
    /// entries and pending queue.
    ///
    /// Malformed persisted JSON is logged and treated as an empty store.
    /// The queue invariant is rebuilt on load: duplicate ids and ids
    /// without a local entry are dropped, and unsynced entries missing
    /// from the queue are re-enqueued.
    ///
    /// The engine starts offline; wire it to a [`ConnectivitySignal`]
    /// with [`Self::attach_connectivity`] or drive [`Self::set_online`]
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store cannot be read or the
    /// repaired queue cannot be persisted.
    pub fn open(config: SyncConfig, local: L, remote: R) -> EngineResult<Self> {
        let entries = load_entries(&local, &config)?;
        let loaded_queue = load_queue(&local, &config)?;
        let queue = repair_queue(&entries, &loaded_queue);

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let status = StatusFeed::new(SyncStatus {
            is_online: false,
            is_syncing: false,
            last_sync_time: None,
            pending_count: queue.len(),
        });

        let inner = EngineInner {
            local,
            remote,
            entries: RwLock::new(entries),
            queue: RwLock::new(queue.clone()),
            online: AtomicBool::new(false),
            syncing: AtomicBool::new(false),
            last_sync: RwLock::new(None),
            status,
            rng: Mutex::new(rng),
            config,
        };

        if queue != loaded_queue {
            inner.persist_queue(&queue)?;
        }

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// The configuration this engine was opened with.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Creates a new entry, durable locally before this returns.
    ///
    /// The entry starts with `synced == false` and is queued for remote
    /// upsert. If the engine is online (and immediate push is enabled) a
    /// best-effort push task is spawned for just this entry; its failure
    /// is logged, never surfaced here - the queue guarantees a retry.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local write fails.
    pub fn create_entry(
        &self,
        content: PracticeContent,
        entry_id: Option<String>,
    ) -> EngineResult<PracticeEntry> {
        let now = Utc::now();
        let entry = {
            let mut rng = self.inner.rng.lock();
            PracticeEntry::new(
                self.inner.config.user_id.clone(),
                content,
                entry_id,
                now,
                &mut *rng,
            )
        };

        {
            let mut entries = self.inner.entries.write();
            entries.insert(entry.entry_id.clone(), entry.clone());
            self.inner.persist_entries(&entries)?;
        }
        self.inner.enqueue(&entry.entry_id)?;
        self.inner.emit_status();

        if self.inner.config.immediate_push && self.is_online() {
            self.spawn_push(entry.clone());
        }
        Ok(entry)
    }

    /// Replaces the content of an existing entry.
    ///
    /// Bumps `updated_at`, resets `synced`, and re-queues the entry. The
    /// new content must be of the same practice kind as the entry.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if the id is unknown,
    /// [`EngineError::PracticeTypeMismatch`] if the content kind differs,
    /// or a storage error if the local write fails.
    pub fn update_entry(&self, entry_id: &str, content: PracticeContent) -> EngineResult<()> {
        let updated = {
            let mut entries = self.inner.entries.write();
            let entry = entries
                .get_mut(entry_id)
                .ok_or_else(|| EngineError::NotFound(entry_id.to_string()))?;
            if entry.practice_type != content.practice_type() {
                return Err(EngineError::PracticeTypeMismatch {
                    expected: entry.practice_type,
                    got: content.practice_type(),
                });
            }
            entry.content = content;
            entry.updated_at = Utc::now();
            entry.synced = false;
            let snapshot = entry.clone();
            self.inner.persist_entries(&entries)?;
            snapshot
        };

        self.inner.enqueue(entry_id)?;
        self.inner.emit_status();

        if self.inner.config.immediate_push && self.is_online() {
            self.spawn_push(updated);
        }
        Ok(())
    }

    /// Removes an entry from the local map and the pending queue.
    ///
    /// Local only: the remote copy is not informed, and a later
    /// [`Self::fetch_from_backend`] can resurrect the entry. Deleting an
    /// unknown id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local write fails.
    pub fn delete_entry(&self, entry_id: &str) -> EngineResult<()> {
        {
            let mut entries = self.inner.entries.write();
            if entries.remove(entry_id).is_some() {
                self.inner.persist_entries(&entries)?;
            }
        }
        {
            let mut queue = self.inner.queue.write();
            if let Some(position) = queue.iter().position(|id| id == entry_id) {
                queue.remove(position);
                self.inner.persist_queue(&queue)?;
            }
        }
        self.inner.emit_status();
        Ok(())
    }

    /// Reads entries from the local map, newest first, optionally
    /// filtered by practice kind. Never touches the network.
    #[must_use]
    pub fn get_entries(&self, practice_type: Option<PracticeType>) -> Vec<PracticeEntry> {
        let entries = self.inner.entries.read();
        let mut result: Vec<PracticeEntry> = entries
            .values()
            .filter(|entry| practice_type.is_none_or(|t| entry.practice_type == t))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });
        result
    }

    /// Reads one entry by id.
    #[must_use]
    pub fn get_entry(&self, entry_id: &str) -> Option<PracticeEntry> {
        self.inner.entries.read().get(entry_id).cloned()
    }

    /// Number of entries awaiting remote confirmation.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.queue.read().len()
    }

    /// Current online flag.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::SeqCst)
    }

    /// Whether a sync pass is currently in flight.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.inner.syncing.load(Ordering::SeqCst)
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.inner.status.current()
    }

    /// Subscribes to status changes.
    ///
    /// The current status is delivered into the channel before this
    /// returns; dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Reports a connectivity change.
    ///
    /// Transitioning offline to online runs a pending flush before
    /// returning; transitioning online to offline only flips the flag
    /// (in-flight attempts are not cancelled). Reporting the current
    /// state again is a no-op.
    pub async fn set_online(&self, online: bool) {
        let was_online = self.inner.online.swap(online, Ordering::SeqCst);
        if was_online == online {
            return;
        }
        self.inner.emit_status();
        if online {
            if let Err(error) = self.sync_pending_entries().await {
                tracing::warn!(%error, "pending flush after reconnect failed");
            }
        }
    }

    /// Spawns a task that forwards the signal's transitions into
    /// [`Self::set_online`], starting from its current state.
    pub fn attach_connectivity(&self, signal: &ConnectivitySignal) {
        let mut watcher = signal.watch();
        let initial = signal.is_online();
        let engine = self.clone();
        tokio::spawn(async move {
            engine.set_online(initial).await;
            while watcher.changed().await.is_ok() {
                let online = *watcher.borrow_and_update();
                engine.set_online(online).await;
            }
        });
    }

    /// Pushes every queued entry to the remote store.
    ///
    /// No-op when offline or when a sync pass is already in flight (the
    /// caller is expected to re-invoke later; connectivity restoration
    /// does so automatically). Upserts are issued concurrently and all
    /// are awaited regardless of individual outcome; each success marks
    /// the entry synced and dequeues it, each failure leaves it queued.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the post-sync state fails;
    /// remote failures are logged, not returned.
    pub async fn sync_pending_entries(&self) -> EngineResult<()> {
        if !self.is_online() {
            return Ok(());
        }
        if self
            .inner
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sync already in progress; skipping");
            return Ok(());
        }
        self.inner.emit_status();

        let result = self.flush_queue().await;
        if result.is_ok() {
            *self.inner.last_sync.write() = Some(Utc::now());
        }
        self.inner.syncing.store(false, Ordering::SeqCst);
        self.inner.emit_status();
        result
    }

    /// Pulls the full remote collection and merges it into the local
    /// map, remote winning on key collision.
    ///
    /// Every entry present remotely is marked `synced == true` after the
    /// merge, and confirmed entries leave the queue. A remote read
    /// failure is logged and leaves local state exactly as it was. No-op
    /// when a sync pass is already in flight.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the merged state fails.
    pub async fn fetch_from_backend(&self) -> EngineResult<()> {
        if self
            .inner
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("sync already in progress; skipping fetch");
            return Ok(());
        }
        self.inner.emit_status();

        let result = match self.inner.remote.get_all(&self.inner.config.user_id).await {
            Ok(remote_entries) => {
                tracing::debug!(count = remote_entries.len(), "merging remote entries");
                let merged = self.inner.merge_remote(remote_entries);
                if merged.is_ok() {
                    *self.inner.last_sync.write() = Some(Utc::now());
                }
                merged
            }
            Err(error) => {
                tracing::warn!(%error, "fetch from backend failed; local state untouched");
                Ok(())
            }
        };
        self.inner.syncing.store(false, Ordering::SeqCst);
        self.inner.emit_status();
        result
    }

    /// Full startup sync: pull first so the remote snapshot is
    /// established, then push whatever is still pending on top of it.
    ///
    /// # Errors
    ///
    /// Propagates local persistence failures from either phase.
    pub async fn initial_sync(&self) -> EngineResult<()> {
        self.fetch_from_backend().await?;
        self.sync_pending_entries().await
    }

    fn spawn_push(&self, entry: PracticeEntry) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.push_entry_best_effort(entry).await;
        });
    }

    async fn push_entry_best_effort(&self, entry: PracticeEntry) {
        let entry_id = entry.entry_id.clone();
        match self
            .inner
            .remote
            .upsert(&self.inner.config.user_id, &entry)
            .await
        {
            Ok(()) => {
                let pushed = [(entry_id.clone(), entry.updated_at)];
                if let Err(error) = self.inner.confirm_synced(&pushed) {
                    tracing::warn!(%entry_id, %error, "failed to persist sync confirmation");
                }
                self.inner.emit_status();
            }
            Err(error) => {
                tracing::warn!(%entry_id, %error, "immediate push failed; entry stays queued");
            }
        }
    }

    async fn flush_queue(&self) -> EngineResult<()> {
        let batch: Vec<PracticeEntry> = {
            let entries = self.inner.entries.read();
            let queue = self.inner.queue.read();
            queue
                .iter()
                .filter_map(|id| entries.get(id).cloned())
                .collect()
        };
        if batch.is_empty() {
            return Ok(());
        }
        tracing::debug!(count = batch.len(), "pushing pending practice entries");

        let user_id = &self.inner.config.user_id;
        let remote = &self.inner.remote;
        let outcomes = join_all(batch.iter().map(|entry| async move {
            let outcome = remote.upsert(user_id, entry).await;
            (entry.entry_id.clone(), entry.updated_at, outcome)
        }))
        .await;

        let mut confirmed = Vec::new();
        for (entry_id, pushed_at, outcome) in outcomes {
            match outcome {
                Ok(()) => confirmed.push((entry_id, pushed_at)),
                Err(error) => {
                    tracing::warn!(%entry_id, %error, "upsert failed; entry stays queued");
                }
            }
        }
        if !confirmed.is_empty() {
            self.inner.confirm_synced(&confirmed)?;
        }
        Ok(())
    }
}

impl<L: LocalStore, R> EngineInner<L, R> {
    fn persist_entries(&self, entries: &HashMap<String, PracticeEntry>) -> EngineResult<()> {
        let json = serde_json::to_string(entries)?;
        self.local.set(&self.config.entries_key(), &json)?;
        Ok(())
    }

    fn persist_queue(&self, queue: &[String]) -> EngineResult<()> {
        let json = serde_json::to_string(queue)?;
        self.local.set(&self.config.queue_key(), &json)?;
        Ok(())
    }

    /// Appends the id to the queue unless it is already present.
    fn enqueue(&self, entry_id: &str) -> EngineResult<()> {
        let mut queue = self.queue.write();
        if !queue.iter().any(|id| id == entry_id) {
            queue.push(entry_id.to_string());
            self.persist_queue(&queue)?;
        }
        Ok(())
    }

    /// Marks pushed entries synced and removes them from the queue.
    ///
    /// `pushed` carries the `updated_at` of the revision that actually
    /// went over the wire. An entry edited while its push was in flight
    /// no longer matches, so it stays queued and unsynced for the next
    /// pass. Ids whose entry was deleted in the meantime are dequeued.
    fn confirm_synced(&self, pushed: &[(String, DateTime<Utc>)]) -> EngineResult<()> {
        let mut entries = self.entries.write();
        let mut queue = self.queue.write();
        let mut confirmed = Vec::new();
        for (entry_id, pushed_at) in pushed {
            match entries.get_mut(entry_id) {
                Some(entry) if entry.updated_at == *pushed_at => {
                    entry.synced = true;
                    confirmed.push(entry_id.clone());
                }
                Some(_) => {
                    tracing::debug!(%entry_id, "entry revised mid-push; stays queued");
                }
                None => confirmed.push(entry_id.clone()),
            }
        }
        queue.retain(|id| !confirmed.contains(id));
        self.persist_entries(&entries)?;
        self.persist_queue(&queue)?;
        Ok(())
    }

    /// Applies a remote snapshot: remote wins on collision, everything
    /// present remotely counts as confirmed.
    fn merge_remote(&self, remote_entries: Vec<PracticeEntry>) -> EngineResult<()> {
        let mut entries = self.entries.write();
        let mut queue = self.queue.write();
        for mut entry in remote_entries {
            entry.synced = true;
            entries.insert(entry.entry_id.clone(), entry);
        }
        queue.retain(|id| entries.get(id).is_some_and(|entry| !entry.synced));
        self.persist_entries(&entries)?;
        self.persist_queue(&queue)?;
        Ok(())
    }

    fn emit_status(&self) {
        let status = SyncStatus {
            is_online: self.online.load(Ordering::SeqCst),
            is_syncing: self.syncing.load(Ordering::SeqCst),
            last_sync_time: *self.last_sync.read(),
            pending_count: self.queue.read().len(),
        };
        self.status.emit(status);
    }
}

fn load_entries<L: LocalStore>(
    local: &L,
    config: &SyncConfig,
) -> EngineResult<HashMap<String, PracticeEntry>> {
    match local.get(&config.entries_key())? {
        None => Ok(HashMap::new()),
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                tracing::warn!(%error, "stored entries are malformed; starting empty");
                Ok(HashMap::new())
            }
        },
    }
}

fn load_queue<L: LocalStore>(local: &L, config: &SyncConfig) -> EngineResult<Vec<String>> {
    match local.get(&config.queue_key())? {
        None => Ok(Vec::new()),
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(queue) => Ok(queue),
            Err(error) => {
                tracing::warn!(%error, "stored queue is malformed; starting empty");
                Ok(Vec::new())
            }
        },
    }
}

/// Rebuilds the queue invariant from loaded state: drops duplicates and
/// ids without an entry, then re-enqueues unsynced entries the loaded
/// queue missed (a crash between the entries write and the queue write
/// can leave those behind).
fn repair_queue(entries: &HashMap<String, PracticeEntry>, loaded: &[String]) -> Vec<String> {
    let mut queue: Vec<String> = Vec::with_capacity(loaded.len());
    for id in loaded {
        if entries.contains_key(id) && !queue.contains(id) {
            queue.push(id.clone());
        }
    }

    let mut missing: Vec<&PracticeEntry> = entries
        .values()
        .filter(|entry| !entry.synced && !queue.contains(&entry.entry_id))
        .collect();
    missing.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.entry_id.cmp(&b.entry_id))
    });
    queue.extend(missing.into_iter().map(|entry| entry.entry_id.clone()));

    queue
}
