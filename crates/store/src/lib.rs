//! `binflow-store` — persistent key-value storage.
//!
//! A thin durable key-value layer used by the offline queue (and anything
//! else that needs to survive a restart). Keys are plain strings namespaced
//! by dotted prefixes (`sync.queue.v1`, ...); values are opaque strings,
//! JSON by convention. Concurrent writers are last-writer-wins.

pub mod kv;
pub mod memory;
pub mod sqlite;

pub use kv::{KeyValueStore, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
