use crate::{Cache, CoreError};
use async_trait::async_trait;
use moka::{Expiry, future::Cache as MokaCache};
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct CacheEntry {
    bytes: Vec<u8>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory implementation of the Cache port using Moka.
/// Suitable for testing and single-process deployments.
#[derive(Clone, Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, CacheEntry>,
    default_ttl: Duration,
}

impl InMemoryCache {
    /// Creates a new InMemoryCache. `default_ttl_seconds` applies to writes that carry no TTL.
    pub fn new(max_capacity: u64, default_ttl_seconds: u64) -> Self {
        let cache = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self {
            cache,
            default_ttl: Duration::from_secs(default_ttl_seconds),
        }
    }
}

impl Default for InMemoryCache {
    /// 10,000 entries, one hour default TTL.
    fn default() -> Self {
        Self::new(10_000, 3600)
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(self.cache.get(key).await.map(|entry| entry.bytes))
    }

    async fn set(
        &self,
        key: &str,
        value: &[u8],
        ttl_seconds: Option<u64>,
    ) -> Result<(), CoreError> {
        let ttl = ttl_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.default_ttl);
        let entry = CacheEntry {
            bytes: value.to_vec(),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CoreError> {
        self.cache.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::default();
        let key = "tenant:slug:fruitland";
        let value = b"{\"id\":\"t1\"}".to_vec();

        cache.set(key, &value, None).await.unwrap();
        let retrieved = cache.get(key).await.unwrap();

        assert_eq!(retrieved, Some(value));
    }

    #[tokio::test]
    async fn test_get_non_existent() {
        let cache = InMemoryCache::default();
        let retrieved = cache.get("tenant:slug:nowhere").await.unwrap();
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::default();
        let key = "session:sess-1";
        let value = b"session".to_vec();

        cache.set(key, &value, None).await.unwrap();
        assert_eq!(cache.get(key).await.unwrap(), Some(value));

        cache.delete(key).await.unwrap();
        assert_eq!(cache.get(key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entry_expires_after_explicit_ttl() {
        let cache = InMemoryCache::new(100, 3600);
        let key = "ttl_key";
        let value = b"ttl_value".to_vec();

        cache.set(key, &value, Some(1)).await.unwrap();
        assert_eq!(
            cache.get(key).await.unwrap(),
            Some(value.clone()),
            "Value should be present immediately after set"
        );

        sleep(Duration::from_millis(1100)).await;

        assert_eq!(
            cache.get(key).await.unwrap(),
            None,
            "Entry should have expired after its own TTL"
        );
    }

    #[tokio::test]
    async fn test_entry_expires_based_on_default_ttl() {
        let cache = InMemoryCache::new(100, 1);
        let key = "default_ttl_key";

        cache.set(key, b"value", None).await.unwrap();
        assert!(cache.get(key).await.unwrap().is_some());

        sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.get(key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_overwrite_resets_ttl() {
        let cache = InMemoryCache::default();
        let key = "overwrite_key";

        cache.set(key, b"value1", Some(1)).await.unwrap();
        cache.set(key, b"value2", Some(60)).await.unwrap();

        sleep(Duration::from_millis(1100)).await;

        assert_eq!(cache.get(key).await.unwrap(), Some(b"value2".to_vec()));
    }
}
