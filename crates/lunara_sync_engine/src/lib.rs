//! # Lunara Sync Engine
//!
//! Offline-first synchronization of practice entries between a durable
//! local store and a remote backend.
//!
//! This crate provides:
//! - Local-first CRUD over practice entries (writes are durable before
//!   any network activity)
//! - A persisted queue of entries pending remote upsert
//! - Best-effort parallel push with per-entry retry-by-requeue
//! - Remote-wins pull and merge
//! - A connectivity signal and a sync-status subscription feed
//!
//! ## Architecture
//!
//! The engine implements a **pull-then-push** model on startup:
//! 1. `fetch_from_backend` pulls the full remote collection and merges it
//!    (remote wins on key collision)
//! 2. `sync_pending_entries` pushes everything still queued
//!
//! ## Key Invariants
//!
//! - The local store is the authority for whether a user's write
//!   succeeded; remote sync is advisory and eventually consistent
//! - Every entry with `synced == false` is in the pending queue; every
//!   confirmed entry is not
//! - At most one sync pass runs at a time; a concurrent call is a silent
//!   no-op
//! - Remote failures are logged and leave the entry queued; they are
//!   never surfaced to the caller that made the local write

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod connectivity;
mod engine;
mod error;
mod remote;
mod status;

pub use config::SyncConfig;
pub use connectivity::ConnectivitySignal;
pub use engine::PracticeSyncEngine;
pub use error::{EngineError, EngineResult, RemoteError, RemoteResult};
pub use remote::{MockRemoteStore, RemoteStore};
pub use status::{StatusFeed, SyncStatus};
