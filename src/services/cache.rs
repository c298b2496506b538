//! Redis cache service implementation
//!
//! Read endpoints consult the cache before the database and populate it on
//! miss; mutations evict by pattern. The trait seam lets tests (and
//! deployments with the cache feature off) run without Redis.

use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::config::settings::RedisConfig;
use crate::utils::errors::Result;

/// Cache interface consumed by the read endpoints and the invalidation
/// bookkeeper
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn set_json(&self, key: &str, value: &serde_json::Value) -> Result<()>;
    /// Delete all keys matching a pattern, returning how many were removed
    async fn delete_pattern(&self, pattern: &str) -> Result<u64>;
}

/// Redis-backed cache with a configurable key prefix and default TTL
#[derive(Clone)]
pub struct RedisCache {
    client: Client,
    config: RedisConfig,
}

impl RedisCache {
    pub fn new(config: RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        Ok(Self { client, config })
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.config.prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_json(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let result: Option<String> = conn.get(&full_key).await?;

        match result {
            Some(data) => {
                let value = serde_json::from_str(&data)?;
                debug!(key = %full_key, "Cache hit");
                Ok(Some(value))
            }
            None => {
                debug!(key = %full_key, "Cache miss");
                Ok(None)
            }
        }
    }

    async fn set_json(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);
        let serialized = serde_json::to_string(value)?;

        let _: () = conn
            .set_ex(&full_key, serialized, self.config.ttl_seconds)
            .await?;

        debug!(key = %full_key, ttl = self.config.ttl_seconds, "Value cached");
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        let full_pattern = self.full_key(pattern);

        let keys: Vec<String> = conn.keys(&full_pattern).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 = conn.del(&keys).await?;
        debug!(pattern = %full_pattern, deleted = deleted, "Keys deleted by pattern");
        Ok(deleted)
    }
}

/// Cache that stores nothing, used when the read cache is disabled
#[derive(Debug, Clone, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get_json(&self, _key: &str) -> Result<Option<serde_json::Value>> {
        Ok(None)
    }

    async fn set_json(&self, _key: &str, _value: &serde_json::Value) -> Result<()> {
        Ok(())
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64> {
        Ok(0)
    }
}

/// Fetch a cached value, or compute and cache it.
///
/// Cache failures degrade to the loader: a broken Redis must not take the
/// read endpoints down with it.
pub async fn cached_or<T, F, Fut>(cache: &dyn Cache, key: &str, loader: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    match cache.get_json(key).await {
        Ok(Some(value)) => {
            if let Ok(decoded) = serde_json::from_value(value) {
                return Ok(decoded);
            }
            debug!(key = %key, "Cached value failed to decode, reloading");
        }
        Ok(None) => {}
        Err(e) => {
            debug!(key = %key, error = %e, "Cache read failed, falling through to loader");
        }
    }

    let value = loader().await?;

    if let Ok(json) = serde_json::to_value(&value) {
        if let Err(e) = cache.set_json(key, &json).await {
            debug!(key = %key, error = %e, "Cache write failed");
        }
    }

    Ok(value)
}
