//! In-memory cache implementation with LRU eviction.
//!
//! Entries carry an optional deadline and expire lazily on access.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use guestbook_core::cache::{pattern_matches, Cache, CacheError, Result};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// In-memory cache implementation with LRU eviction.
///
/// Thread-safe cache using `Arc<RwLock<LruCache>>` for concurrent access.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl MemoryCache {
    /// Creates a cache holding at most `max_entries` keys (at least one).
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut store = self.store.write().await;

        match store.get(key) {
            Some(entry) if entry.is_expired() => {
                store.pop(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut store = self.store.write().await;
        store.put(key.to_string(), CacheEntry::new(value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let mut store = self.store.write().await;
        for key in keys {
            store.pop(key);
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let store = self.store.read().await;
        Ok(store
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let mut store = self.store.write().await;

        let (current, expires_at) = match store.get(key) {
            Some(entry) if !entry.is_expired() => {
                let text = std::str::from_utf8(&entry.value).map_err(|_| {
                    CacheError::OperationFailed(format!("value at {key} is not an integer"))
                })?;
                let current: i64 = text.parse().map_err(|_| {
                    CacheError::OperationFailed(format!("value at {key} is not an integer"))
                })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let next = current + 1;
        store.put(
            key.to_string(),
            CacheEntry {
                value: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        let mut store = self.store.write().await;
        if let Some(entry) = store.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestbook_core::cache::CacheRepository;
    use serde::{Deserialize, Serialize};

    /// Default max entries for tests
    const TEST_MAX_ENTRIES: usize = 1000;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        cache.set("guest:1", b"value", None).await.unwrap();
        assert_eq!(cache.get("guest:1").await.unwrap(), Some(b"value".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        assert_eq!(cache.get("guest:missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_many_and_missing() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        cache.set("guest:1", b"a", None).await.unwrap();
        cache.set("guest:2", b"b", None).await.unwrap();

        cache
            .delete(&[
                "guest:1".to_string(),
                "guest:2".to_string(),
                "guest:missing".to_string(),
            ])
            .await
            .unwrap();

        assert!(cache.get("guest:1").await.unwrap().is_none());
        assert!(cache.get("guest:2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        cache
            .set("guest:ttl", b"short-lived", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert!(cache.get("guest:ttl").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("guest:ttl").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_by_pattern_skips_expired() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        cache.set("guest:1", b"a", None).await.unwrap();
        cache.set("guest:list:count", b"2", None).await.unwrap();
        cache.set("host:1", b"x", None).await.unwrap();
        cache
            .set("guest:old", b"x", Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut keys = cache.keys("guest:*").await.unwrap();
        keys.sort();

        assert_eq!(keys, vec!["guest:1", "guest:list:count"]);
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let cache = MemoryCache::new(2);
        cache.set("a", b"1", None).await.unwrap();
        cache.set("b", b"2", None).await.unwrap();
        cache.set("c", b"3", None).await.unwrap();

        assert!(cache.get("a").await.unwrap().is_none());
        assert!(cache.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_incr_and_expire() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        assert_eq!(cache.incr("guest:lock").await.unwrap(), 1);
        assert_eq!(cache.incr("guest:lock").await.unwrap(), 2);

        cache
            .expire("guest:lock", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.incr("guest:lock").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_incr_on_non_integer_fails() {
        let cache = MemoryCache::new(TEST_MAX_ENTRIES);
        cache.set("guest:1", b"{}", None).await.unwrap();
        assert!(matches!(
            cache.incr("guest:1").await,
            Err(CacheError::OperationFailed(_))
        ));
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
    }

    #[tokio::test]
    async fn test_lock_unlock_through_repository() {
        let repo: CacheRepository<Item> = CacheRepository::new(Arc::new(MemoryCache::new(10)));

        repo.lock("guest:lock", Duration::from_secs(5)).await.unwrap();
        assert_eq!(
            repo.lock("guest:lock", Duration::from_secs(5)).await,
            Err(CacheError::Conflict("guest:lock".to_string()))
        );

        repo.unlock("guest:lock").await.unwrap();
        repo.lock("guest:lock", Duration::from_secs(5)).await.unwrap();
    }
}
