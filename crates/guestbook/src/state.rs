//! Application state shared by every transport.
//!
//! Backends are chosen at compile time: `memory` wires the in-process cache
//! and queue, `redis` wires Redis for both. Storage is always SQLite.

use std::sync::Arc;

use guestbook_core::cache::{Cache, CacheRepository};
use guestbook_core::events::{EventPublisher, MessageQueue};
use guestbook_core::webhook::WebhookSender;

use crate::config::Config;
use crate::services::GuestService;
use crate::storage::{SqliteDatabase, SqliteRepository};
use crate::webhook::HttpWebhookSender;

/// Shared application state.
///
/// Cloned for each request handler and consumer task; every field is a
/// cheap handle over a long-lived resource.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub guests: GuestService,
    /// Queue the event consumer reads from.
    pub queue: Arc<dyn MessageQueue>,
}

impl AppState {
    /// Wires the guest service on top of already constructed backends.
    pub fn build(
        config: Config,
        db: SqliteDatabase,
        cache: Arc<dyn Cache>,
        queue: Arc<dyn MessageQueue>,
        webhook: Arc<dyn WebhookSender>,
    ) -> Self {
        let guests = GuestService::new(
            Arc::new(SqliteRepository::new(db)),
            CacheRepository::new(cache),
            config.guest.cache.clone(),
            EventPublisher::new(queue.clone()),
            config.guest.event.clone(),
            webhook,
        );

        Self {
            config: Arc::new(config),
            guests,
            queue,
        }
    }
}

async fn connect_database(config: &Config) -> Result<SqliteDatabase, anyhow::Error> {
    Ok(SqliteDatabase::connect(&config.database).await?)
}

fn webhook_sender(config: &Config) -> Result<Arc<dyn WebhookSender>, anyhow::Error> {
    Ok(Arc::new(HttpWebhookSender::new(&config.webhook)?))
}

// ============================================================================
// Factory functions for the backend features
// ============================================================================

#[cfg(feature = "memory")]
mod memory_backend {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::queue::MemoryQueue;

    impl AppState {
        /// Creates AppState with SQLite storage and in-process cache and queue.
        pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
            let db = connect_database(&config).await?;
            let cache = Arc::new(MemoryCache::new(config.cache.max_entries));
            let queue = Arc::new(MemoryQueue::new());
            let webhook = webhook_sender(&config)?;

            tracing::info!("Using in-memory cache and queue");
            Ok(Self::build(config, db, cache, queue, webhook))
        }
    }
}

#[cfg(feature = "redis")]
mod redis_backend {
    use super::*;
    use crate::cache::RedisCache;
    use crate::queue::RedisQueue;

    impl AppState {
        /// Creates AppState with SQLite storage and Redis cache and queue.
        pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
            let db = connect_database(&config).await?;
            let cache = Arc::new(RedisCache::new(&config.cache.redis_url).await?);
            let queue = Arc::new(
                RedisQueue::new(&config.event_producer_url, config.server.consumer_name()).await?,
            );
            let webhook = webhook_sender(&config)?;

            tracing::info!(
                cache = %config.cache.redis_url,
                queue = %config.event_producer_url,
                "Using Redis cache and queue"
            );
            Ok(Self::build(config, db, cache, queue, webhook))
        }
    }
}

#[cfg(all(test, feature = "memory"))]
pub(crate) mod test_support {
    use std::time::Duration;

    use async_trait::async_trait;
    use guestbook_core::guest::GuestEvent;
    use guestbook_core::{RequestContext, ServiceError};

    use super::*;
    use crate::cache::MemoryCache;
    use crate::queue::MemoryQueue;

    /// Webhook that accepts everything.
    pub struct NoopWebhook;

    #[async_trait]
    impl WebhookSender for NoopWebhook {
        async fn send_webhook(
            &self,
            _ctx: &RequestContext,
            _event: &GuestEvent,
        ) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    /// State over a migrated in-memory database and in-process backends.
    pub async fn state_with(webhook: Arc<dyn WebhookSender>) -> AppState {
        let db = SqliteDatabase::in_memory(Duration::from_secs(5))
            .await
            .unwrap();
        AppState::build(
            Config::default(),
            db,
            Arc::new(MemoryCache::new(100)),
            Arc::new(MemoryQueue::with_receive_timeout(Duration::from_millis(50))),
            webhook,
        )
    }

    pub async fn state() -> AppState {
        state_with(Arc::new(NoopWebhook)).await
    }
}
