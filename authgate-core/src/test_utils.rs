use crate::codec::JwtCodec;
use crate::session::{SessionManager, TokenSettings};
use crate::store::{StoreError, StoreItem, TokenStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// HashMap-backed store with expiry and failure injection.
///
/// Batches are applied under a single lock, so they are all-or-nothing for
/// concurrent readers.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    puts: AtomicUsize,
}

impl MemoryStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of successful `put` batches.
    pub(crate) fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub(crate) fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap()
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    /// Overwrites a raw value, bypassing the batch contract.
    pub(crate) fn insert_raw(&self, key: &str, value: &[u8]) {
        self.entries.lock().unwrap().insert(
            key.to_string(),
            (value.to_vec(), Instant::now() + Duration::from_secs(60)),
        );
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn put(&self, items: &[StoreItem]) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("write refused".to_string()));
        }
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        for item in items {
            entries.insert(item.key.clone(), (item.value.clone(), now + item.ttl));
        }
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("read refused".to_string()));
        }
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    async fn delete(&self, keys: &[&str]) -> Result<usize, StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("delete refused".to_string()));
        }
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        let mut removed = 0;
        for key in keys {
            if let Some((_, expires_at)) = entries.remove(*key) {
                if expires_at > now {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }
}

pub(crate) fn test_settings() -> TokenSettings {
    TokenSettings {
        access_secret: b"access-secret".to_vec(),
        access_ttl: Duration::from_secs(900),
        refresh_secret: b"refresh-secret".to_vec(),
        refresh_ttl: Duration::from_secs(3600),
    }
}

pub(crate) fn session_manager(store: Arc<MemoryStore>) -> Arc<SessionManager> {
    let _ = env_logger::builder().is_test(true).try_init();
    Arc::new(SessionManager::new(
        store,
        Arc::new(JwtCodec::default()),
        test_settings(),
    ))
}
