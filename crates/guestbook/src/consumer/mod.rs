//! Event consumer transport.
//!
//! One task per enabled guest topic reads from the queue in the consumer group
//! named after the server. Handled messages are acked; failed ones are requeued
//! after a delay until they reach the attempt limit, then dropped.

mod guest;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinSet;

use guestbook_core::events::{Message, MessageQueue};

use crate::services::GuestService;
use crate::state::AppState;

pub use guest::handle_guest_event;

/// Settings shared by every topic worker.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub group: String,
    pub max_attempts: u32,
    pub requeue_delay: Duration,
}

/// Consumes `topic` until a shutdown signal arrives.
pub async fn consume_topic(
    queue: Arc<dyn MessageQueue>,
    guests: GuestService,
    topic: String,
    settings: ConsumerSettings,
    mut shutdown: broadcast::Receiver<()>,
) {
    tracing::info!(topic = %topic, group = %settings.group, "Consumer started");

    loop {
        let received = tokio::select! {
            _ = shutdown.recv() => break,
            received = queue.receive(&topic, &settings.group) => received,
        };

        match received {
            Ok(Some(message)) => handle(&*queue, &guests, &settings, message).await,
            Ok(None) => {}
            Err(err) => {
                tracing::error!(topic = %topic, error = %err, "Failed to receive message");
                tokio::time::sleep(settings.requeue_delay).await;
            }
        }
    }

    tracing::info!(topic = %topic, "Consumer stopped");
}

async fn handle(
    queue: &dyn MessageQueue,
    guests: &GuestService,
    settings: &ConsumerSettings,
    message: Message,
) {
    let outcome = match handle_guest_event(guests, &message).await {
        Ok(()) => queue.ack(&settings.group, &message).await,
        Err(err) if message.attempts + 1 < settings.max_attempts => {
            tracing::warn!(
                topic = %message.topic,
                message_id = %message.id,
                attempts = message.attempts + 1,
                error = %err,
                "Message handling failed, requeueing"
            );
            queue
                .requeue(&settings.group, &message, settings.requeue_delay)
                .await
        }
        Err(err) => {
            tracing::error!(
                topic = %message.topic,
                message_id = %message.id,
                attempts = message.attempts + 1,
                error = %err,
                "Message handling failed, dropping"
            );
            queue.ack(&settings.group, &message).await
        }
    };

    if let Err(err) = outcome {
        tracing::error!(topic = %message.topic, message_id = %message.id, error = %err, "Failed to settle message");
    }
}

/// Starts one worker per enabled guest topic.
pub fn spawn_consumers(state: &AppState, shutdown: &broadcast::Sender<()>) -> JoinSet<()> {
    let settings = ConsumerSettings {
        group: state.config.server.name.clone(),
        max_attempts: state.config.server.consumer_max_attempts,
        requeue_delay: state.config.server.consumer_requeue_delay(),
    };

    let events = &state.config.guest.event;
    let mut workers = JoinSet::new();
    for topic in [&events.created, &events.updated, &events.deleted] {
        if !topic.enable {
            tracing::info!(topic = %topic.topic, "Topic disabled, not consuming");
            continue;
        }
        workers.spawn(consume_topic(
            state.queue.clone(),
            state.guests.clone(),
            topic.topic.clone(),
            settings.clone(),
            shutdown.subscribe(),
        ));
    }
    workers
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use guestbook_core::events::EventEnvelope;
    use guestbook_core::guest::GuestEvent;
    use guestbook_core::webhook::WebhookSender;
    use guestbook_core::{RequestContext, ServiceError};

    use super::*;
    use crate::state::test_support;

    #[derive(Default)]
    struct Webhook {
        received: Mutex<Vec<(String, GuestEvent)>>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WebhookSender for Webhook {
        async fn send_webhook(
            &self,
            ctx: &RequestContext,
            event: &GuestEvent,
        ) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ServiceError::Upstream {
                    status: 500,
                    message: "down".into(),
                });
            }
            self.received
                .lock()
                .unwrap()
                .push((ctx.request_id.to_string(), event.clone()));
            Ok(())
        }
    }

    fn settings(max_attempts: u32) -> ConsumerSettings {
        ConsumerSettings {
            group: "guestbook".into(),
            max_attempts,
            requeue_delay: Duration::ZERO,
        }
    }

    fn event() -> GuestEvent {
        GuestEvent {
            id: "0190a4b2-7c3e-7def-8a12-3456789abcde".into(),
            name: "Arya".into(),
            ..Default::default()
        }
    }

    async fn run_until_idle(state: &AppState, settings: ConsumerSettings) {
        let (shutdown, _) = broadcast::channel(1);
        let worker = tokio::spawn(consume_topic(
            state.queue.clone(),
            state.guests.clone(),
            "guest.created".into(),
            settings,
            shutdown.subscribe(),
        ));
        tokio::time::sleep(Duration::from_millis(300)).await;
        shutdown.send(()).unwrap();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_event_is_forwarded_with_producer_request_id() {
        let webhook = Arc::new(Webhook::default());
        let state = test_support::state_with(webhook.clone()).await;
        let ctx = RequestContext::default();

        let body = EventEnvelope::new(&ctx, "guest.created", &event())
            .to_bytes()
            .unwrap();
        state.queue.publish("guest.created", &body).await.unwrap();

        run_until_idle(&state, settings(3)).await;

        let received = webhook.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, ctx.request_id.to_string());
        assert_eq!(received[0].1, event());
    }

    #[tokio::test]
    async fn test_failures_are_retried_up_to_max_attempts() {
        let webhook = Arc::new(Webhook {
            fail: true,
            ..Default::default()
        });
        let state = test_support::state_with(webhook.clone()).await;

        let body = EventEnvelope::new(&RequestContext::default(), "guest.created", &event())
            .to_bytes()
            .unwrap();
        state.queue.publish("guest.created", &body).await.unwrap();

        run_until_idle(&state, settings(3)).await;

        assert_eq!(webhook.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_undecodable_message_is_dropped_after_retries() {
        let webhook = Arc::new(Webhook::default());
        let state = test_support::state_with(webhook.clone()).await;

        state
            .queue
            .publish("guest.created", b"not an envelope")
            .await
            .unwrap();

        run_until_idle(&state, settings(2)).await;

        assert_eq!(webhook.calls.load(Ordering::SeqCst), 0);
        assert!(state
            .queue
            .receive("guest.created", "guestbook")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_spawn_consumers_skips_disabled_topics() {
        let mut state = test_support::state().await;
        let mut config = (*state.config).clone();
        config.guest.event.updated.enable = false;
        state.config = Arc::new(config);

        let (shutdown, _) = broadcast::channel(1);
        let mut workers = spawn_consumers(&state, &shutdown);
        assert_eq!(workers.len(), 2);

        shutdown.send(()).unwrap();
        while workers.join_next().await.is_some() {}
    }
}
