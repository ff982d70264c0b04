use crate::config::{AppConfig, CacheStore};
use async_trait::async_trait;
use authgate_core::{StoreError, StoreItem, TokenStore};
use log::info;
use thiserror::Error;

pub mod memory;
pub mod redis;

/// Errors that can occur while setting up the token store
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Token store implementation selected at startup.
///
/// Both backends honour the batch contract of [`TokenStore`]: a batched
/// write or delete is observed all-or-nothing by concurrent readers.
#[derive(Clone)]
pub enum Cache {
    /// In-memory store using Moka, local to this process
    InMemory(memory::InMemoryCache),
    /// Redis-based store, shared between instances
    Redis(redis::RedisCache),
}

#[async_trait]
impl TokenStore for Cache {
    async fn put(&self, items: &[StoreItem]) -> Result<(), StoreError> {
        match self {
            Self::InMemory(cache) => cache.put(items).await,
            Self::Redis(cache) => cache.put(items).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Redis(cache) => cache.get(key).await,
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<usize, StoreError> {
        match self {
            Self::InMemory(cache) => cache.delete(keys).await,
            Self::Redis(cache) => cache.delete(keys).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(cache) => cache.health_check().await,
            Self::Redis(cache) => cache.health_check().await,
        }
    }
}

/// Creates the token store selected by the configuration.
pub async fn create_cache(config: &AppConfig) -> Result<Cache, CacheError> {
    let store = config.cache.store_kind().map_err(CacheError::Config)?;
    info!("Using {} token store", store);

    match store {
        CacheStore::InMemory => {
            let cache = memory::InMemoryCache::new(config.cache.memory.capacity)
                .map_err(CacheError::Config)?;
            Ok(Cache::InMemory(cache))
        }
        CacheStore::Redis => {
            if config.cache.redis.url.is_empty() {
                return Err(CacheError::Config(
                    "Redis URL is required for Redis token store".to_string(),
                ));
            }
            let cache = redis::RedisCache::new(&config.cache.redis.url)
                .await
                .map_err(CacheError::Redis)?;
            Ok(Cache::Redis(cache))
        }
    }
}
