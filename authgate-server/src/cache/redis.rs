use async_trait::async_trait;
use authgate_core::{StoreError, StoreItem, TokenStore};
use log::error;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

#[derive(Clone)]
pub struct RedisCache {
    conn_manager: ConnectionManager,
}

impl RedisCache {
    /// Initialize a new Redis store instance
    pub async fn new(redis_url: &str) -> Result<Self, String> {
        let client = match Client::open(redis_url) {
            Ok(client) => client,
            Err(err) => {
                return Err(format!("Failed to connect to Redis: {}", err));
            }
        };

        let conn_manager = match ConnectionManager::new(client).await {
            Ok(manager) => manager,
            Err(err) => {
                return Err(format!(
                    "Failed to create Redis connection manager: {}",
                    err
                ));
            }
        };

        // Test the connection to ensure it's working
        let mut conn = conn_manager.clone();
        if let Err(err) = redis::cmd("PING").query_async::<String>(&mut conn).await {
            return Err(format!("Failed to ping Redis: {}", err));
        }

        Ok(Self { conn_manager })
    }
}

/// Redis expiries have second granularity and reject zero.
fn ttl_secs(item: &StoreItem) -> u64 {
    item.ttl.as_secs().max(1)
}

#[async_trait]
impl TokenStore for RedisCache {
    async fn put(&self, items: &[StoreItem]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }

        // MULTI/EXEC so the batch is applied as one unit
        let mut pipe = redis::pipe();
        pipe.atomic();
        for item in items {
            pipe.set_ex(&item.key, item.value.as_slice(), ttl_secs(item))
                .ignore();
        }

        let mut conn = self.conn_manager.clone();
        match pipe.query_async::<()>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => {
                error!("Redis error while storing {} keys: {}", items.len(), err);
                Err(StoreError::Backend(err.to_string()))
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.conn_manager.clone();

        match conn.get::<_, Option<Vec<u8>>>(key).await {
            Ok(value) => Ok(value),
            Err(err) => {
                error!("Redis error while getting key {}: {}", key, err);
                Err(StoreError::Backend(err.to_string()))
            }
        }
    }

    async fn delete(&self, keys: &[&str]) -> Result<usize, StoreError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn_manager.clone();

        // A single DEL is atomic and reports how many keys existed
        match conn.del::<_, usize>(keys).await {
            Ok(removed) => Ok(removed),
            Err(err) => {
                error!("Redis error while deleting keys {:?}: {}", keys, err);
                Err(StoreError::Backend(err.to_string()))
            }
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        let mut conn = self.conn_manager.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => Ok(()),
            Err(err) => Err(format!("Redis health check failed: {}", err)),
        }
    }
}
