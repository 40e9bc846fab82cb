use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::CacheConfig;

/// TTL tier for a cached payload. Tag/rating data barely moves and gets the
/// long tier; popularity data moves fast and gets the medium tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    Long,
    Medium,
}

impl CacheTier {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheTier::Long => "long",
            CacheTier::Medium => "medium",
        }
    }
}

#[async_trait]
pub trait EnrichmentCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn put(&self, key: &str, value: Value, tier: CacheTier);
}

/// Read-through helper: return the payload stored under `key`, or run the
/// producer, store its result in `tier`, and return it. A stale or
/// undecodable entry counts as a miss.
pub async fn cached<T, F, Fut, E>(
    cache: &dyn EnrichmentCache,
    key: &str,
    tier: CacheTier,
    producer: F,
) -> Result<T, E>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if let Some(value) = cache.get(key).await {
        if let Ok(decoded) = serde_json::from_value(value) {
            debug!(key, tier = tier.as_str(), "cache hit");
            return Ok(decoded);
        }
    }

    let produced = producer().await?;
    if let Ok(value) = serde_json::to_value(&produced) {
        cache.put(key, value, tier).await;
    }
    Ok(produced)
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// In-process cache with per-tier TTLs. Expired entries are dropped on read.
pub struct MemoryCache {
    long_ttl: Duration,
    medium_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new(config: &CacheConfig) -> Self {
        MemoryCache {
            long_ttl: config.long_ttl,
            medium_ttl: config.medium_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn ttl_for(&self, tier: CacheTier) -> Duration {
        match tier {
            CacheTier::Long => self.long_ttl,
            CacheTier::Medium => self.medium_ttl,
        }
    }
}

#[async_trait]
impl EnrichmentCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn put(&self, key: &str, value: Value, tier: CacheTier) {
        let expires_at = Instant::now() + self.ttl_for(tier);
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
    }
}
