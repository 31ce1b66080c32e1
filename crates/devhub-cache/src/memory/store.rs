//! In-memory cache implementation using the moka crate.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;

use devhub_core::config::MemoryCacheConfig;
use devhub_core::result::AppResult;
use devhub_core::traits::cache::CacheProvider;

/// A live key, remembered with the TTL it was written with.
#[derive(Debug, Clone)]
struct Cached {
    ttl: Duration,
}

/// Expires each entry after its own TTL.
#[derive(Debug)]
struct PerEntryTtl;

impl Expiry<String, Cached> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Cached, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Cached,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, Cached>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn set(&self, key: &str, _value: &str, ttl: Duration) -> AppResult<()> {
        self.cache.insert(key.to_string(), Cached { ttl }).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.get(key).await.is_some())
    }

    async fn set_nx(&self, key: &str, _value: &str, ttl: Duration) -> AppResult<bool> {
        // entry().or_insert_with() runs the init for exactly one caller.
        let entry = self
            .cache
            .entry(key.to_string())
            .or_insert_with(async { Cached { ttl } })
            .await;
        Ok(entry.is_fresh())
    }
}
