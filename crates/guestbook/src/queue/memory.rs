//! In-process message queue.
//!
//! Every topic owns a FIFO of pending messages. Consumer groups are not
//! tracked: all consumers of a topic compete for the same messages, which
//! matches a single group per process.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, RwLock};
use uuid::Uuid;

use guestbook_core::events::{Message, MessageQueue, Result};

/// How long `receive` waits for a message before returning `None`.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct TopicQueue {
    pending: Mutex<VecDeque<Message>>,
    notify: Notify,
}

impl TopicQueue {
    async fn push(&self, message: Message) {
        self.pending.lock().await.push_back(message);
        self.notify.notify_one();
    }
}

/// In-memory queue shared by publishers and consumers of one process.
#[derive(Debug, Clone)]
pub struct MemoryQueue {
    topics: Arc<RwLock<HashMap<String, Arc<TopicQueue>>>>,
    receive_timeout: Duration,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::with_receive_timeout(RECEIVE_TIMEOUT)
    }

    pub fn with_receive_timeout(receive_timeout: Duration) -> Self {
        Self {
            topics: Arc::new(RwLock::new(HashMap::new())),
            receive_timeout,
        }
    }

    async fn topic(&self, name: &str) -> Arc<TopicQueue> {
        {
            let topics = self.topics.read().await;
            if let Some(queue) = topics.get(name) {
                return queue.clone();
            }
        }

        let mut topics = self.topics.write().await;

        // Double-check after acquiring write lock
        if let Some(queue) = topics.get(name) {
            return queue.clone();
        }

        let queue = Arc::new(TopicQueue::default());
        topics.insert(name.to_string(), queue.clone());
        queue
    }

    async fn enqueue(&self, message: Message, delay: Duration) {
        let queue = self.topic(&message.topic).await;

        if delay.is_zero() {
            queue.push(message).await;
            return;
        }

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.push(message).await;
        });
    }
}

impl Default for MemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn new_message(topic: &str, body: &[u8], attempts: u32) -> Message {
    Message {
        id: Uuid::new_v4().to_string(),
        topic: topic.to_string(),
        body: body.to_vec(),
        attempts,
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn publish(&self, topic: &str, body: &[u8]) -> Result<()> {
        self.enqueue(new_message(topic, body, 0), Duration::ZERO)
            .await;
        Ok(())
    }

    async fn publish_with_delay(&self, topic: &str, body: &[u8], delay: Duration) -> Result<()> {
        self.enqueue(new_message(topic, body, 0), delay).await;
        Ok(())
    }

    async fn receive(&self, topic: &str, _group: &str) -> Result<Option<Message>> {
        let queue = self.topic(topic).await;
        let deadline = tokio::time::Instant::now() + self.receive_timeout;

        loop {
            // Register interest before checking so a concurrent push is not missed.
            let notified = queue.notify.notified();

            if let Some(message) = queue.pending.lock().await.pop_front() {
                return Ok(Some(message));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn ack(&self, _group: &str, _message: &Message) -> Result<()> {
        // Messages leave the queue on receive.
        Ok(())
    }

    async fn requeue(&self, _group: &str, message: &Message, delay: Duration) -> Result<()> {
        let retry = new_message(&message.topic, &message.body, message.attempts + 1);
        tracing::debug!(
            topic = %message.topic,
            attempts = retry.attempts,
            delay_ms = delay.as_millis() as u64,
            "Requeueing message"
        );
        self.enqueue(retry, delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUP: &str = "guestbook";

    fn queue() -> MemoryQueue {
        MemoryQueue::with_receive_timeout(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_publish_then_receive() {
        let queue = queue();
        queue.publish("guest.created", b"{}").await.unwrap();

        let message = queue.receive("guest.created", GROUP).await.unwrap().unwrap();

        assert_eq!(message.topic, "guest.created");
        assert_eq!(message.body, b"{}");
        assert_eq!(message.attempts, 0);
    }

    #[tokio::test]
    async fn test_receive_times_out_when_empty() {
        let queue = queue();
        assert!(queue.receive("guest.created", GROUP).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_topics_are_isolated_and_ordered() {
        let queue = queue();
        queue.publish("guest.created", b"1").await.unwrap();
        queue.publish("guest.updated", b"x").await.unwrap();
        queue.publish("guest.created", b"2").await.unwrap();

        let first = queue.receive("guest.created", GROUP).await.unwrap().unwrap();
        let second = queue.receive("guest.created", GROUP).await.unwrap().unwrap();

        assert_eq!(first.body, b"1");
        assert_eq!(second.body, b"2");
        assert!(queue.receive("guest.created", GROUP).await.unwrap().is_none());
        assert!(queue.receive("guest.updated", GROUP).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_receive_wakes_on_publish() {
        let queue = MemoryQueue::with_receive_timeout(Duration::from_secs(2));
        let publisher = queue.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            publisher.publish("guest.deleted", b"late").await.unwrap();
        });

        let message = queue.receive("guest.deleted", GROUP).await.unwrap();
        handle.await.unwrap();

        assert_eq!(message.unwrap().body, b"late");
    }

    #[tokio::test]
    async fn test_delayed_message_delivered_only_after_delay() {
        let queue = queue();
        queue
            .publish_with_delay("guest.created", b"later", Duration::from_millis(150))
            .await
            .unwrap();

        assert!(queue.receive("guest.created", GROUP).await.unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;

        let message = queue.receive("guest.created", GROUP).await.unwrap();
        assert_eq!(message.unwrap().body, b"later");
    }

    #[tokio::test]
    async fn test_requeue_increments_attempts() {
        let queue = queue();
        queue.publish("guest.updated", b"retry").await.unwrap();
        let message = queue.receive("guest.updated", GROUP).await.unwrap().unwrap();

        queue.requeue(GROUP, &message, Duration::ZERO).await.unwrap();

        let again = queue.receive("guest.updated", GROUP).await.unwrap().unwrap();
        assert_eq!(again.attempts, 1);
        assert_eq!(again.body, b"retry");
        assert_ne!(again.id, message.id);
    }
}
