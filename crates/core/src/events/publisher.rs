use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::context::RequestContext;

use super::{EventEnvelope, MessageQueue, Result};

/// Wraps payloads in an [`EventEnvelope`] and hands them to a queue.
#[derive(Clone)]
pub struct EventPublisher {
    queue: Arc<dyn MessageQueue>,
}

impl EventPublisher {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    pub async fn publish<T: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        topic: &str,
        event_name: &str,
        payload: &T,
    ) -> Result<()> {
        let body = EventEnvelope::new(ctx, event_name, payload).to_bytes()?;
        tracing::debug!(request_id = %ctx.request_id, topic, event_name, "Publishing event");
        self.queue.publish(topic, &body).await
    }

    pub async fn publish_with_delay<T: Serialize + Sync>(
        &self,
        ctx: &RequestContext,
        topic: &str,
        delay: Duration,
        event_name: &str,
        payload: &T,
    ) -> Result<()> {
        let body = EventEnvelope::new(ctx, event_name, payload).to_bytes()?;
        tracing::debug!(
            request_id = %ctx.request_id,
            topic,
            event_name,
            delay_ms = delay.as_millis() as u64,
            "Publishing delayed event"
        );
        self.queue.publish_with_delay(topic, &body, delay).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::events::{EventError, Message};

    #[derive(Default)]
    struct RecordingQueue {
        published: Mutex<Vec<(String, Vec<u8>, Duration)>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageQueue for RecordingQueue {
        async fn publish(&self, topic: &str, body: &[u8]) -> Result<()> {
            self.publish_with_delay(topic, body, Duration::ZERO).await
        }

        async fn publish_with_delay(&self, topic: &str, body: &[u8], delay: Duration) -> Result<()> {
            if self.fail {
                return Err(EventError::PublishFailed("queue down".into()));
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), body.to_vec(), delay));
            Ok(())
        }

        async fn receive(&self, _topic: &str, _group: &str) -> Result<Option<Message>> {
            Ok(None)
        }

        async fn ack(&self, _group: &str, _message: &Message) -> Result<()> {
            Ok(())
        }

        async fn requeue(&self, _group: &str, _message: &Message, _delay: Duration) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_wraps_payload_in_envelope() {
        let queue = Arc::new(RecordingQueue::default());
        let publisher = EventPublisher::new(queue.clone());
        let ctx = RequestContext::default();

        publisher
            .publish(&ctx, "guest.created", "guest.created", &"hello")
            .await
            .unwrap();

        let published = queue.published.lock().unwrap();
        let (topic, body, delay) = &published[0];
        assert_eq!(topic, "guest.created");
        assert_eq!(*delay, Duration::ZERO);

        let envelope = EventEnvelope::<String>::from_bytes(body).unwrap();
        assert_eq!(envelope.event_name, "guest.created");
        assert_eq!(envelope.message, "hello");
        assert_eq!(envelope.context(), ctx);
    }

    #[tokio::test]
    async fn test_publish_with_delay_passes_delay() {
        let queue = Arc::new(RecordingQueue::default());
        let publisher = EventPublisher::new(queue.clone());

        publisher
            .publish_with_delay(
                &RequestContext::default(),
                "t",
                Duration::from_secs(3),
                "e",
                &1_u8,
            )
            .await
            .unwrap();

        assert_eq!(queue.published.lock().unwrap()[0].2, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        let queue = Arc::new(RecordingQueue {
            fail: true,
            ..Default::default()
        });
        let publisher = EventPublisher::new(queue);

        let err = publisher
            .publish(&RequestContext::default(), "t", "e", &1_u8)
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::PublishFailed(_)));
    }
}
