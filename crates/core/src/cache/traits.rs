use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// Byte-level cache backend.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes every given key. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<()>;

    /// Lists keys matching a glob pattern (e.g. `guest:*`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Atomically increments an integer key, creating it at 1.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Sets the TTL of an existing key.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;
}
