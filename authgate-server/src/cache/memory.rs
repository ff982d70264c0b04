use async_trait::async_trait;
use authgate_core::{StoreError, StoreItem, TokenStore};
use moka::future::Cache as MokaCache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Clone)]
struct Entry {
    value: Arc<[u8]>,
    ttl: Duration,
}

/// Expires every entry after its own TTL.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct InMemoryCache {
    cache: MokaCache<String, Entry>,
    // Batches take the write half so readers never see a partial batch
    batch_lock: Arc<RwLock<()>>,
}

impl InMemoryCache {
    /// Initialize a new in-memory store bounded to `capacity_mib` MiB
    pub fn new(capacity_mib: usize) -> Result<Self, String> {
        let max_capacity_bytes: u64 = capacity_mib
            .checked_mul(1024 * 1024)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| format!("Capacity of {capacity_mib} MiB is too large"))?;

        let cache = MokaCache::builder()
            .expire_after(EntryExpiry)
            .weigher(|key: &String, entry: &Entry| -> u32 {
                (key.len() + entry.value.len())
                    .try_into()
                    .unwrap_or(u32::MAX)
            })
            .max_capacity(max_capacity_bytes)
            .build();

        Ok(Self {
            cache,
            batch_lock: Arc::new(RwLock::new(())),
        })
    }
}

#[async_trait]
impl TokenStore for InMemoryCache {
    async fn put(&self, items: &[StoreItem]) -> Result<(), StoreError> {
        let _guard = self.batch_lock.write().await;
        for item in items {
            let entry = Entry {
                value: Arc::from(item.value.as_slice()),
                ttl: item.ttl,
            };
            self.cache.insert(item.key.clone(), entry).await;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let _guard = self.batch_lock.read().await;
        Ok(self.cache.get(key).await.map(|entry| entry.value.to_vec()))
    }

    async fn delete(&self, keys: &[&str]) -> Result<usize, StoreError> {
        let _guard = self.batch_lock.write().await;
        let mut removed = 0;
        for key in keys {
            // Expired entries do not count as removed
            if self.cache.get(*key).await.is_some() {
                removed += 1;
            }
            self.cache.invalidate(*key).await;
        }
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}
