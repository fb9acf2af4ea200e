use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// A message delivered by a [`MessageQueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Backend-assigned delivery id, used for acknowledgement.
    pub id: String,
    pub topic: String,
    pub body: Vec<u8>,
    /// Number of previous failed deliveries.
    pub attempts: u32,
}

/// Byte-level message queue with consumer groups and delayed delivery.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn publish(&self, topic: &str, body: &[u8]) -> Result<()>;

    async fn publish_with_delay(&self, topic: &str, body: &[u8], delay: Duration) -> Result<()>;

    /// Waits up to a backend-defined timeout for the next message of `group`.
    async fn receive(&self, topic: &str, group: &str) -> Result<Option<Message>>;

    async fn ack(&self, group: &str, message: &Message) -> Result<()>;

    /// Acknowledges `message` and schedules it again with one more attempt.
    async fn requeue(&self, group: &str, message: &Message, delay: Duration) -> Result<()>;
}
