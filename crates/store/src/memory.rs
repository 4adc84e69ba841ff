//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::kv::{KeyValueStore, StoreError};

/// In-memory [`KeyValueStore`].
///
/// Intended for tests/dev. Nothing survives a drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().expect("kv lock poisoned");
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().expect("kv lock poisoned");
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().expect("kv lock poisoned");
        entries.remove(key);
        Ok(())
    }
}
