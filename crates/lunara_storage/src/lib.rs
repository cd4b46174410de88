//! # Lunara Storage
//!
//! Local persistence trait and implementations for Lunara.
//!
//! This crate provides the durable local key-value capability that the
//! sync engine writes through. Stores are **opaque string stores** - they
//! do not interpret the values they hold; the engine owns all JSON
//! encoding and decoding.
//!
//! ## Design Principles
//!
//! - Stores hold UTF-8 strings under string keys, nothing more
//! - `set` is durable when it returns (or the store is explicitly
//!   ephemeral, like [`InMemoryStore`])
//! - Must be `Send + Sync` so an engine can be shared with background
//!   tasks
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral sessions
//! - [`FileStore`] - One JSON file on disk, replaced atomically on write
//!
//! ## Example
//!
//! ```rust
//! use lunara_storage::{InMemoryStore, LocalStore};
//!
//! let store = InMemoryStore::new();
//! store.set("greeting", "hello").unwrap();
//! assert_eq!(store.get("greeting").unwrap(), Some("hello".to_string()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use store::LocalStore;
