//! In-memory storage, shared by every clone.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use brokle_core::result::AppResult;
use brokle_core::traits::StateStorage;

/// Process-local storage. Clones share the same map, so several session
/// instances built from one `MemoryStorage` see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl StateStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> AppResult<()> {
        self.items.remove(key);
        Ok(())
    }
}
