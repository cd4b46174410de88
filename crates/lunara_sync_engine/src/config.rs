//! Configuration for the sync engine.

/// Configuration for a [`crate::PracticeSyncEngine`].
///
/// One engine is constructed per authenticated session; the `user_id`
/// scopes both the local storage keys and the remote collection.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// The authenticated user this engine belongs to.
    pub user_id: String,
    /// Prefix for the local storage keys.
    pub storage_prefix: String,
    /// Whether `create_entry` / `update_entry` fire an immediate
    /// best-effort push when online (the queue guarantees eventual sync
    /// either way).
    pub immediate_push: bool,
    /// Seed for entry-id generation. `None` seeds from OS entropy;
    /// tests set this for deterministic ids.
    pub rng_seed: Option<u64>,
}

impl SyncConfig {
    /// Creates a configuration for the given user with defaults.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            storage_prefix: "lunara".into(),
            immediate_push: true,
            rng_seed: None,
        }
    }

    /// Sets the local storage key prefix.
    #[must_use]
    pub fn with_storage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.storage_prefix = prefix.into();
        self
    }

    /// Enables or disables the immediate per-entry push on CRUD calls.
    #[must_use]
    pub fn with_immediate_push(mut self, enabled: bool) -> Self {
        self.immediate_push = enabled;
        self
    }

    /// Seeds the id generator.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// The local storage key holding the serialized entry map.
    #[must_use]
    pub fn entries_key(&self) -> String {
        format!("{}/{}/practice_entries", self.storage_prefix, self.user_id)
    }

    /// The local storage key holding the serialized pending queue.
    #[must_use]
    pub fn queue_key(&self) -> String {
        format!("{}/{}/practice_queue", self.storage_prefix, self.user_id)
    }
}
