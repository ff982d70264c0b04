use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during token store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// One entry of a batched write.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreItem {
    pub key: String,
    pub value: Vec<u8>,
    pub ttl: Duration,
}

impl StoreItem {
    pub fn new(key: impl Into<String>, value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value,
            ttl,
        }
    }
}

/// Key-value contract used to persist cross-reference records.
///
/// Values are opaque bytes. Implementations must make a batched `put` and a
/// batched `delete` visible all-or-nothing to concurrent readers: a reader
/// racing a batch sees every key of the batch or none of them. Expired keys
/// behave exactly like missing ones.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store every item with its own TTL, as one unit.
    async fn put(&self, items: &[StoreItem]) -> Result<(), StoreError>;

    /// Retrieve a value, `None` when the key is missing or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Delete every key in one call and return how many keys were removed.
    async fn delete(&self, keys: &[&str]) -> Result<usize, StoreError>;

    /// Checks connectivity to the backend.
    async fn health_check(&self) -> Result<(), String>;
}
