//! Guest use cases.
//!
//! Reads are cache-aside. Writes run in a transaction on the primary; cache
//! invalidation and event publication happen afterwards in [`GuestService::after_write`]
//! and never change the outcome of the write.

use std::sync::Arc;

use guestbook_core::cache::{
    all_keys_pattern, count_key, format_key, list_query_key, CacheError, CacheRepository,
};
use guestbook_core::events::EventPublisher;
use guestbook_core::guest::{
    by_id_filter, find_all_filter, parse_sorts, CreateGuestRequest, DeleteGuestByIdRequest,
    FindAllGuestRequest, FindAllGuestResponse, FindGuestByIdRequest, Guest, GuestEvent,
    GuestResponse, UpdateGuestByIdRequest,
};
use guestbook_core::storage::{Filter, Repository, Sort};
use guestbook_core::webhook::WebhookSender;
use guestbook_core::{RequestContext, ServiceError};

use crate::config::{GuestCacheConfig, GuestEventConfig, TopicConfig};

type Result<T> = std::result::Result<T, ServiceError>;

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A write executed inside a transaction.
enum Write<'a> {
    Create(&'a Guest),
    Update(&'a Guest, Filter),
}

/// Guest CRUD plus event forwarding.
#[derive(Clone)]
pub struct GuestService {
    repository: Arc<dyn Repository<Guest>>,
    cache: CacheRepository<Guest>,
    cache_config: GuestCacheConfig,
    events: EventPublisher,
    topics: GuestEventConfig,
    webhook: Arc<dyn WebhookSender>,
}

impl GuestService {
    pub fn new(
        repository: Arc<dyn Repository<Guest>>,
        cache: CacheRepository<Guest>,
        cache_config: GuestCacheConfig,
        events: EventPublisher,
        topics: GuestEventConfig,
        webhook: Arc<dyn WebhookSender>,
    ) -> Self {
        Self {
            repository,
            cache,
            cache_config,
            events,
            topics,
            webhook,
        }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateGuestRequest,
    ) -> Result<GuestResponse> {
        request.validate()?;
        let guest = request.to_guest(now_ms());

        self.persist(ctx, Write::Create(&guest)).await?;
        tracing::info!(request_id = %ctx.request_id, guest_id = %guest.id, "Guest created");

        self.after_write(ctx, &self.topics.created, &guest).await;
        Ok(GuestResponse::from(&guest))
    }

    pub async fn delete_by_id(
        &self,
        ctx: &RequestContext,
        request: DeleteGuestByIdRequest,
    ) -> Result<()> {
        let id = request.validate()?;
        let filter = by_id_filter(id);
        let mut guest = self.repository.find_one(ctx, &filter, &[], true).await?;

        guest.mark_deleted(&request.deleted_by, now_ms());
        self.persist(ctx, Write::Update(&guest, filter)).await?;
        tracing::info!(request_id = %ctx.request_id, guest_id = %id, "Guest deleted");

        self.after_write(ctx, &self.topics.deleted, &guest).await;
        Ok(())
    }

    pub async fn update_by_id(
        &self,
        ctx: &RequestContext,
        request: UpdateGuestByIdRequest,
    ) -> Result<GuestResponse> {
        let id = request.validate()?;
        let filter = by_id_filter(id);
        let mut guest = self.repository.find_one(ctx, &filter, &[], true).await?;

        request.apply(&mut guest, now_ms());
        self.persist(ctx, Write::Update(&guest, filter)).await?;
        tracing::info!(request_id = %ctx.request_id, guest_id = %id, "Guest updated");

        self.after_write(ctx, &self.topics.updated, &guest).await;
        Ok(GuestResponse::from(&guest))
    }

    /// Lists active guests. The page and the total count are fetched concurrently.
    pub async fn find_all(
        &self,
        ctx: &RequestContext,
        request: FindAllGuestRequest,
    ) -> Result<FindAllGuestResponse> {
        let sorts = parse_sorts(&request.sorts)?;
        let filter = find_all_filter(&request.keyword);
        let list_key = list_query_key(
            &self.cache_config.keyf,
            &request.keyword,
            &request.sorts,
            request.take,
            request.skip,
        );
        let count_key = count_key(&list_key);

        let (list, count) = tokio::join!(
            self.find_list(ctx, &filter, &sorts, request.take, request.skip, &list_key),
            self.find_count(ctx, &filter, &count_key),
        );
        let list = list?;
        let count = count?;

        Ok(FindAllGuestResponse::new(&list, count))
    }

    pub async fn find_by_id(
        &self,
        ctx: &RequestContext,
        request: FindGuestByIdRequest,
    ) -> Result<GuestResponse> {
        let id = request.validate()?;
        let key = format_key(&self.cache_config.keyf, &id.to_string());

        if self.cache_config.enable {
            match self.cache.get(&key).await {
                Ok(guest) => return Ok(GuestResponse::from(&guest)),
                Err(CacheError::NotFound(_)) => {}
                Err(err) => {
                    tracing::warn!(request_id = %ctx.request_id, key = %key, error = %err, "Cache read failed");
                }
            }
        }

        let guest = self
            .repository
            .find_one(ctx, &by_id_filter(id), &[], false)
            .await?;

        if self.cache_config.enable {
            if let Err(err) = self
                .cache
                .set(&key, &guest, self.cache_config.duration())
                .await
            {
                tracing::warn!(request_id = %ctx.request_id, key = %key, error = %err, "Cache write failed");
            }
        }

        Ok(GuestResponse::from(&guest))
    }

    /// Forwards a received guest event to the webhook.
    pub async fn process_event(&self, ctx: &RequestContext, event: GuestEvent) -> Result<()> {
        self.webhook.send_webhook(ctx, &event).await
    }

    async fn find_list(
        &self,
        ctx: &RequestContext,
        filter: &Filter,
        sorts: &[Sort],
        take: u64,
        skip: u64,
        key: &str,
    ) -> Result<Vec<Guest>> {
        if self.cache_config.enable {
            match self.cache.get_list(key).await {
                Ok(list) if !list.is_empty() => return Ok(list),
                Ok(_) | Err(CacheError::NotFound(_)) => {}
                Err(err) => {
                    tracing::warn!(request_id = %ctx.request_id, key, error = %err, "Cache read failed");
                }
            }
        }

        let list = self
            .repository
            .find_all(ctx, filter, sorts, take, skip, false)
            .await?;

        if self.cache_config.enable && !list.is_empty() {
            if let Err(err) = self
                .cache
                .set_list(key, &list, self.cache_config.duration())
                .await
            {
                tracing::warn!(request_id = %ctx.request_id, key, error = %err, "Cache write failed");
            }
        }

        Ok(list)
    }

    async fn find_count(&self, ctx: &RequestContext, filter: &Filter, key: &str) -> Result<u64> {
        if self.cache_config.enable {
            match self.cache.get_count(key).await {
                Ok(count) if count > 0 => return Ok(count),
                Ok(_) | Err(CacheError::NotFound(_)) => {}
                Err(err) => {
                    tracing::warn!(request_id = %ctx.request_id, key, error = %err, "Cache read failed");
                }
            }
        }

        let count = self.repository.count(ctx, filter, false).await?;

        if self.cache_config.enable && count > 0 {
            if let Err(err) = self
                .cache
                .set_count(key, count, self.cache_config.duration())
                .await
            {
                tracing::warn!(request_id = %ctx.request_id, key, error = %err, "Cache write failed");
            }
        }

        Ok(count)
    }

    /// Runs `write` in a transaction. On failure the transaction is rolled
    /// back and the write error is returned.
    async fn persist(&self, ctx: &RequestContext, write: Write<'_>) -> Result<()> {
        let mut tx = self.repository.begin_transaction(ctx).await?;

        let result = match &write {
            Write::Create(guest) => tx.create(ctx, guest).await,
            Write::Update(guest, filter) => tx.update(ctx, guest, filter).await,
        };

        if let Err(err) = result {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(
                    request_id = %ctx.request_id,
                    error = %rollback_err,
                    "Rollback failed"
                );
            }
            return Err(err.into());
        }

        tx.commit().await?;
        Ok(())
    }

    /// Post-commit side effects. Failures are only logged.
    async fn after_write(&self, ctx: &RequestContext, topic: &TopicConfig, guest: &Guest) {
        self.invalidate_cache(ctx).await;

        if !topic.enable {
            return;
        }

        let event = GuestEvent::from(guest);
        if let Err(err) = self
            .events
            .publish(ctx, &topic.topic, &topic.topic, &event)
            .await
        {
            tracing::error!(
                request_id = %ctx.request_id,
                topic = %topic.topic,
                guest_id = %guest.id,
                error = %err,
                "Failed to publish guest event"
            );
        }
    }

    async fn invalidate_cache(&self, ctx: &RequestContext) {
        if !self.cache_config.enable {
            return;
        }

        let pattern = all_keys_pattern(&self.cache_config.keyf);
        let keys = match self.cache.keys(&pattern).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(request_id = %ctx.request_id, pattern = %pattern, error = %err, "Cache key listing failed");
                return;
            }
        };

        if let Err(err) = self.cache.delete(&keys).await {
            tracing::warn!(request_id = %ctx.request_id, keys = keys.len(), error = %err, "Cache invalidation failed");
        }
    }
}
