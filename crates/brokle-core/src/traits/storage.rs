//! Durable key/value storage for client session state.

use async_trait::async_trait;

use crate::result::AppResult;

/// String key/value storage that survives restarts (the local-storage
/// equivalent for a session instance).
///
/// Implementations must make `set_item` visible to every later `get_item`
/// on the same backend, including from other instances sharing it.
#[async_trait]
pub trait StateStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key is absent.
    async fn get_item(&self, key: &str) -> AppResult<Option<String>>;

    /// Store a value, replacing any previous one.
    async fn set_item(&self, key: &str, value: &str) -> AppResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove_item(&self, key: &str) -> AppResult<()>;
}
