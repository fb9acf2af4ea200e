use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use super::{deserialize, serialize, Cache, CacheError, Result};

/// Typed JSON view over a byte-level [`Cache`].
///
/// Missing keys surface as [`CacheError::NotFound`] so callers can tell a miss
/// apart from a backend failure.
pub struct CacheRepository<T> {
    cache: Arc<dyn Cache>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for CacheRepository<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            _marker: PhantomData,
        }
    }
}

fn ttl_option(ttl: Duration) -> Option<Duration> {
    (!ttl.is_zero()).then_some(ttl)
}

impl<T> CacheRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self {
            cache,
            _marker: PhantomData,
        }
    }

    async fn get_raw<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        let bytes = self
            .cache
            .get(key)
            .await?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        Ok(deserialize(&bytes)?)
    }

    async fn set_raw<V: Serialize + ?Sized>(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        let bytes = serialize(value)?;
        self.cache.set(key, &bytes, ttl_option(ttl)).await
    }

    pub async fn get(&self, key: &str) -> Result<T> {
        self.get_raw(key).await
    }

    pub async fn get_list(&self, key: &str) -> Result<Vec<T>> {
        self.get_raw(key).await
    }

    pub async fn get_count(&self, key: &str) -> Result<u64> {
        self.get_raw(key).await
    }

    pub async fn set(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.set_raw(key, value, ttl).await
    }

    pub async fn set_list(&self, key: &str, values: &[T], ttl: Duration) -> Result<()> {
        self.set_raw(key, values, ttl).await
    }

    pub async fn set_count(&self, key: &str, count: u64, ttl: Duration) -> Result<()> {
        self.set_raw(key, &count, ttl).await
    }

    /// Deletes every given key; an empty slice does nothing.
    pub async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        self.cache.delete(keys).await
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.cache.keys(pattern).await
    }

    /// Takes a counter-based lock on `key`.
    ///
    /// The increment and the expiry are two separate calls, so a crash in
    /// between leaves a lock without TTL.
    pub async fn lock(&self, key: &str, ttl: Duration) -> Result<()> {
        let count = self.cache.incr(key).await?;
        if count > 1 {
            return Err(CacheError::Conflict(key.to_string()));
        }
        if !ttl.is_zero() {
            self.cache.expire(key, ttl).await?;
        }
        Ok(())
    }

    pub async fn unlock(&self, key: &str) -> Result<()> {
        self.cache.delete(&[key.to_string()]).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::cache::pattern_matches;

    #[derive(Default)]
    struct MockCache {
        data: Mutex<HashMap<String, Vec<u8>>>,
        ttls: Mutex<HashMap<String, Duration>>,
    }

    #[async_trait]
    impl Cache for MockCache {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            if let Some(ttl) = ttl {
                self.ttls.lock().unwrap().insert(key.to_string(), ttl);
            }
            Ok(())
        }

        async fn delete(&self, keys: &[String]) -> Result<()> {
            let mut data = self.data.lock().unwrap();
            for key in keys {
                data.remove(key);
            }
            Ok(())
        }

        async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
            Ok(self
                .data
                .lock()
                .unwrap()
                .keys()
                .filter(|k| pattern_matches(pattern, k))
                .cloned()
                .collect())
        }

        async fn incr(&self, key: &str) -> Result<i64> {
            let mut data = self.data.lock().unwrap();
            let current: i64 = data
                .get(key)
                .and_then(|b| std::str::from_utf8(b).ok()?.parse().ok())
                .unwrap_or(0);
            let next = current + 1;
            data.insert(key.to_string(), next.to_string().into_bytes());
            Ok(next)
        }

        async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
            self.ttls.lock().unwrap().insert(key.to_string(), ttl);
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
    }

    fn setup() -> (Arc<MockCache>, CacheRepository<Item>) {
        let cache = Arc::new(MockCache::default());
        let repo = CacheRepository::new(cache.clone() as Arc<dyn Cache>);
        (cache, repo)
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let (_, repo) = setup();
        let err = repo.get("item:1").await.unwrap_err();
        assert_eq!(err, CacheError::NotFound("item:1".to_string()));
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (cache, repo) = setup();
        let ttl = Duration::from_secs(60);

        repo.set("item:1", &Item { id: 1 }, ttl).await.unwrap();

        assert_eq!(repo.get("item:1").await.unwrap(), Item { id: 1 });
        assert_eq!(cache.ttls.lock().unwrap().get("item:1"), Some(&ttl));
    }

    #[tokio::test]
    async fn test_list_and_count() {
        let (_, repo) = setup();
        let items = vec![Item { id: 1 }, Item { id: 2 }];

        repo.set_list("item:list", &items, Duration::from_secs(1))
            .await
            .unwrap();
        repo.set_count("item:list:count", 2, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(repo.get_list("item:list").await.unwrap(), items);
        assert_eq!(repo.get_count("item:list:count").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_is_serialization_error() {
        let (cache, repo) = setup();
        cache
            .set("item:1", b"not json", None)
            .await
            .unwrap();

        let err = repo.get("item:1").await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_delete_empty_and_missing_keys_is_noop() {
        let (_, repo) = setup();
        repo.delete(&[]).await.unwrap();
        repo.delete(&["item:missing".to_string()]).await.unwrap();
    }

    #[tokio::test]
    async fn test_keys_then_delete_invalidates() {
        let (_, repo) = setup();
        let ttl = Duration::from_secs(60);
        repo.set("item:1", &Item { id: 1 }, ttl).await.unwrap();
        repo.set("item:2", &Item { id: 2 }, ttl).await.unwrap();

        let keys = repo.keys("item:*").await.unwrap();
        assert_eq!(keys.len(), 2);
        repo.delete(&keys).await.unwrap();

        assert!(repo.keys("item:*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_twice_conflicts() {
        let (cache, repo) = setup();
        let ttl = Duration::from_secs(5);

        repo.lock("item:lock", ttl).await.unwrap();
        let err = repo.lock("item:lock", ttl).await.unwrap_err();

        assert_eq!(err, CacheError::Conflict("item:lock".to_string()));
        assert_eq!(cache.ttls.lock().unwrap().get("item:lock"), Some(&ttl));
    }

    #[tokio::test]
    async fn test_unlock_then_lock_succeeds() {
        let (_, repo) = setup();
        repo.lock("item:lock", Duration::ZERO).await.unwrap();
        repo.unlock("item:lock").await.unwrap();
        repo.lock("item:lock", Duration::ZERO).await.unwrap();
    }

    #[tokio::test]
    async fn test_unlock_missing_key_is_noop() {
        let (_, repo) = setup();
        repo.unlock("item:never-locked").await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_ttl_skips_expire() {
        let (cache, repo) = setup();
        repo.lock("item:lock", Duration::ZERO).await.unwrap();
        assert!(cache.ttls.lock().unwrap().is_empty());
    }
}
