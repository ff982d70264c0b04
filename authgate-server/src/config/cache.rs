use confique::Config;
use std::fmt;
use std::str::FromStr;

/// Specifies which token store implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStore {
    InMemory,
    Redis,
}

impl FromStr for CacheStore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in-memory" | "memory" => Ok(CacheStore::InMemory),
            "redis" => Ok(CacheStore::Redis),
            other => Err(format!(
                "unknown cache store '{other}', expected 'in-memory' or 'redis'"
            )),
        }
    }
}

impl fmt::Display for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStore::InMemory => f.write_str("in-memory"),
            CacheStore::Redis => f.write_str("redis"),
        }
    }
}

/// Configuration for the token store
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Store type: "in-memory" (default) or "redis"
    #[config(env = "AUTHGATE_CACHE_STORE", default = "in-memory")]
    pub store: String,

    /// In-memory store specific configuration
    #[config(nested)]
    pub memory: InMemoryConfig,

    /// Redis store specific configuration
    #[config(nested)]
    pub redis: RedisConfig,
}

impl CacheConfig {
    pub fn store_kind(&self) -> Result<CacheStore, String> {
        self.store.parse()
    }
}

/// In-memory store configuration options
#[derive(Debug, Config, Clone)]
pub struct InMemoryConfig {
    /// Maximum capacity in MiB (default: 128 MiB)
    #[config(env = "AUTHGATE_CACHE_MEMORY_CAPACITY", default = 128)]
    pub capacity: usize,
}

/// Redis store configuration options
#[derive(Config, Clone)]
pub struct RedisConfig {
    /// Redis connection string
    #[config(env = "AUTHGATE_CACHE_REDIS_URL", default = "")]
    pub url: String,
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = match url::Url::parse(&self.url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                let _ = parsed.set_password(Some("redacted"));
                parsed.to_string()
            }
            Ok(_) => self.url.clone(),
            Err(_) if self.url.is_empty() => String::new(),
            Err(_) => "<unparsable>".to_string(),
        };
        f.debug_struct("RedisConfig").field("url", &url).finish()
    }
}
