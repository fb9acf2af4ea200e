//! Redis Streams message queue.
//!
//! Topics are stream keys and consumer groups are stream groups. Delayed
//! messages wait in a sorted set `<topic>:delayed` scored by their due time in
//! milliseconds; `receive` promotes the due ones into the stream before reading.
//!
//! Entries delivered but never acked (a crash, or a read cancelled at
//! shutdown) stay pending in the group. `receive` reclaims entries idle for
//! longer than the claim window with `XAUTOCLAIM` before reading new ones.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamId, StreamRangeReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use guestbook_core::events::{EventError, Message, MessageQueue, Result};

/// How long `XREADGROUP` blocks waiting for a message.
const BLOCK_MS: usize = 1000;

/// Maximum delayed messages promoted per `receive` call.
const PROMOTE_BATCH: isize = 100;

/// Pending entries idle for longer than this are handed to another consumer.
const CLAIM_IDLE: Duration = Duration::from_secs(60);

/// Moves one delayed member into the stream, only if this caller removed it.
const PROMOTE_SCRIPT: &str = r"
if redis.call('ZREM', KEYS[1], ARGV[1]) == 1 then
  return redis.call('XADD', KEYS[2], '*', 'body', ARGV[2], 'attempts', ARGV[3])
end
return false
";

fn map_redis_error(err: redis::RedisError) -> EventError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        EventError::ConnectionFailed(err.to_string())
    } else {
        EventError::ReceiveFailed(err.to_string())
    }
}

fn publish_error(err: redis::RedisError) -> EventError {
    match map_redis_error(err) {
        EventError::ReceiveFailed(message) => EventError::PublishFailed(message),
        other => other,
    }
}

fn delayed_key(topic: &str) -> String {
    format!("{topic}:delayed")
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn to_message(topic: &str, entry: StreamId) -> Message {
    let body: Vec<u8> = entry.get("body").unwrap_or_default();
    let attempts: u32 = entry.get("attempts").unwrap_or_default();
    Message {
        id: entry.id,
        topic: topic.to_string(),
        body,
        attempts,
    }
}

/// Member of the delayed sorted set. The nonce keeps identical bodies distinct.
#[derive(Debug, Serialize, Deserialize)]
struct DelayedEntry {
    nonce: String,
    attempts: u32,
    body: Vec<u8>,
}

/// Redis Streams backend.
///
/// Publishing shares one multiplexed connection. Every `(topic, group)` reader
/// gets its own connection so a blocking read never stalls another topic.
pub struct RedisQueue {
    client: redis::Client,
    writer: ConnectionManager,
    consumer: String,
    claim_idle: Duration,
    readers: Mutex<HashMap<(String, String), ConnectionManager>>,
}

impl RedisQueue {
    /// Connects to `url`, reading as `consumer` within each group.
    ///
    /// The consumer name should be stable across restarts so entries it left
    /// pending are found again.
    pub async fn new(url: &str, consumer: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let writer = ConnectionManager::new(client.clone())
            .await
            .map_err(map_redis_error)?;

        Ok(Self {
            client,
            writer,
            consumer: consumer.into(),
            claim_idle: CLAIM_IDLE,
            readers: Mutex::new(HashMap::new()),
        })
    }

    pub fn with_claim_idle(mut self, claim_idle: Duration) -> Self {
        self.claim_idle = claim_idle;
        self
    }

    async fn add(&self, topic: &str, body: &[u8], attempts: u32) -> Result<()> {
        let mut conn = self.writer.clone();
        let _id: String = redis::cmd("XADD")
            .arg(topic)
            .arg("*")
            .arg("body")
            .arg(body)
            .arg("attempts")
            .arg(attempts)
            .query_async(&mut conn)
            .await
            .map_err(publish_error)?;
        Ok(())
    }

    async fn schedule(&self, topic: &str, body: &[u8], attempts: u32, delay: Duration) -> Result<()> {
        let entry = DelayedEntry {
            nonce: Uuid::new_v4().to_string(),
            attempts,
            body: body.to_vec(),
        };
        let member = serde_json::to_string(&entry)
            .map_err(|e| EventError::Serialization(e.to_string()))?;
        let due = now_ms() + i64::try_from(delay.as_millis()).unwrap_or(i64::MAX / 2);

        let mut conn = self.writer.clone();
        conn.zadd::<_, _, _, ()>(delayed_key(topic), member, due)
            .await
            .map_err(publish_error)
    }

    /// Reader connection for `(topic, group)`, creating the group on first use.
    async fn reader(&self, topic: &str, group: &str) -> Result<ConnectionManager> {
        let key = (topic.to_string(), group.to_string());
        let mut readers = self.readers.lock().await;
        if let Some(conn) = readers.get(&key) {
            return Ok(conn.clone());
        }

        let mut writer = self.writer.clone();
        let created: redis::RedisResult<()> = writer.xgroup_create_mkstream(topic, group, "0").await;
        match created {
            Ok(()) => {
                tracing::info!(topic, group, "Created consumer group");
            }
            Err(err) if err.code() == Some("BUSYGROUP") => {}
            Err(err) => return Err(map_redis_error(err)),
        }

        let conn = ConnectionManager::new(self.client.clone())
            .await
            .map_err(map_redis_error)?;
        readers.insert(key, conn.clone());
        Ok(conn)
    }

    /// Moves due delayed messages into the stream.
    async fn promote_due(&self, topic: &str) -> Result<()> {
        let key = delayed_key(topic);
        let mut conn = self.writer.clone();
        let due: Vec<String> = conn
            .zrangebyscore_limit(&key, "-inf", now_ms(), 0, PROMOTE_BATCH)
            .await
            .map_err(map_redis_error)?;

        let script = redis::Script::new(PROMOTE_SCRIPT);
        for member in due {
            let entry = match serde_json::from_str::<DelayedEntry>(&member) {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::error!(topic, error = %err, "Dropping malformed delayed message");
                    let _: i64 = conn.zrem(&key, &member).await.map_err(map_redis_error)?;
                    continue;
                }
            };

            let _promoted: Option<String> = script
                .key(&key)
                .key(topic)
                .arg(&member)
                .arg(&entry.body)
                .arg(entry.attempts)
                .invoke_async(&mut conn)
                .await
                .map_err(map_redis_error)?;
        }
        Ok(())
    }

    /// Takes over one entry left pending longer than the claim window.
    async fn claim_stale(&self, topic: &str, group: &str) -> Result<Option<Message>> {
        let mut conn = self.writer.clone();
        let reply: Vec<redis::Value> = redis::cmd("XAUTOCLAIM")
            .arg(topic)
            .arg(group)
            .arg(&self.consumer)
            .arg(u64::try_from(self.claim_idle.as_millis()).unwrap_or(u64::MAX))
            .arg("0-0")
            .arg("COUNT")
            .arg(1)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;

        let Some(claimed) = reply.get(1) else {
            return Ok(None);
        };
        let claimed: StreamRangeReply = redis::from_redis_value(claimed).map_err(map_redis_error)?;

        Ok(claimed.ids.into_iter().next().map(|entry| {
            tracing::warn!(topic, group, message_id = %entry.id, "Reclaimed stale pending message");
            to_message(topic, entry)
        }))
    }
}

#[async_trait]
impl MessageQueue for RedisQueue {
    async fn publish(&self, topic: &str, body: &[u8]) -> Result<()> {
        self.add(topic, body, 0).await
    }

    async fn publish_with_delay(&self, topic: &str, body: &[u8], delay: Duration) -> Result<()> {
        if delay.is_zero() {
            return self.add(topic, body, 0).await;
        }
        self.schedule(topic, body, 0, delay).await
    }

    async fn receive(&self, topic: &str, group: &str) -> Result<Option<Message>> {
        let mut reader = self.reader(topic, group).await?;
        self.promote_due(topic).await?;

        if let Some(message) = self.claim_stale(topic, group).await? {
            return Ok(Some(message));
        }

        let options = StreamReadOptions::default()
            .group(group, &self.consumer)
            .count(1)
            .block(BLOCK_MS);

        let reply: StreamReadReply = reader
            .xread_options(&[topic], &[">"], &options)
            .await
            .map_err(map_redis_error)?;

        Ok(reply
            .keys
            .into_iter()
            .flat_map(|key| key.ids)
            .next()
            .map(|entry| to_message(topic, entry)))
    }

    async fn ack(&self, group: &str, message: &Message) -> Result<()> {
        let mut conn = self.writer.clone();
        conn.xack::<_, _, _, ()>(&message.topic, group, &[&message.id])
            .await
            .map_err(map_redis_error)
    }

    async fn requeue(&self, group: &str, message: &Message, delay: Duration) -> Result<()> {
        let attempts = message.attempts + 1;
        if delay.is_zero() {
            self.add(&message.topic, &message.body, attempts).await?;
        } else {
            self.schedule(&message.topic, &message.body, attempts, delay)
                .await?;
        }
        self.ack(group, message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Skip test if Redis not available.
    async fn get_test_queue() -> Option<RedisQueue> {
        RedisQueue::new(&redis_url(), "guestbook-test").await.ok()
    }

    fn test_topic() -> String {
        format!("test:guest.events:{}", Uuid::new_v4())
    }

    async fn cleanup(queue: &RedisQueue, topic: &str) {
        let mut conn = queue.writer.clone();
        let _: redis::RedisResult<()> = conn.del(&[topic.to_string(), delayed_key(topic)]).await;
    }

    #[tokio::test]
    async fn test_redis_publish_receive_ack() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let topic = test_topic();

        queue.publish(&topic, b"{\"name\":\"Arya\"}").await.unwrap();
        let message = queue.receive(&topic, "guestbook").await.unwrap().unwrap();

        assert_eq!(message.body, b"{\"name\":\"Arya\"}");
        assert_eq!(message.attempts, 0);
        queue.ack("guestbook", &message).await.unwrap();

        cleanup(&queue, &topic).await;
    }

    #[tokio::test]
    async fn test_redis_delayed_message_waits() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let topic = test_topic();

        queue
            .publish_with_delay(&topic, b"later", Duration::from_millis(1500))
            .await
            .unwrap();
        assert!(queue.receive(&topic, "guestbook").await.unwrap().is_none());

        tokio::time::sleep(Duration::from_millis(600)).await;

        let message = queue.receive(&topic, "guestbook").await.unwrap();
        assert_eq!(message.map(|m| m.body), Some(b"later".to_vec()));

        cleanup(&queue, &topic).await;
    }

    #[tokio::test]
    async fn test_redis_requeue_increments_attempts() {
        let Some(queue) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let topic = test_topic();

        queue.publish(&topic, b"retry").await.unwrap();
        let message = queue.receive(&topic, "guestbook").await.unwrap().unwrap();
        queue
            .requeue("guestbook", &message, Duration::ZERO)
            .await
            .unwrap();

        let again = queue.receive(&topic, "guestbook").await.unwrap().unwrap();
        assert_eq!(again.attempts, 1);

        cleanup(&queue, &topic).await;
    }

    #[tokio::test]
    async fn test_redis_unacked_message_is_reclaimed() {
        let Some(crashed) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let Ok(survivor) = RedisQueue::new(&redis_url(), "guestbook-survivor").await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let survivor = survivor.with_claim_idle(Duration::from_millis(100));
        let topic = test_topic();

        crashed.publish(&topic, b"orphan").await.unwrap();
        let lost = crashed.receive(&topic, "guestbook").await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;

        let reclaimed = survivor.receive(&topic, "guestbook").await.unwrap().unwrap();
        assert_eq!(reclaimed.id, lost.id);
        assert_eq!(reclaimed.body, b"orphan");
        survivor.ack("guestbook", &reclaimed).await.unwrap();

        cleanup(&crashed, &topic).await;
    }

    #[tokio::test]
    async fn test_redis_delayed_message_promoted_once() {
        let Some(first) = get_test_queue().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let Ok(second) = RedisQueue::new(&redis_url(), "guestbook-other").await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };
        let topic = test_topic();

        first
            .publish_with_delay(&topic, b"once", Duration::from_millis(50))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let (a, b) = tokio::join!(first.promote_due(&topic), second.promote_due(&topic));
        a.unwrap();
        b.unwrap();

        let mut conn = first.writer.clone();
        let length: usize = conn.xlen(&topic).await.unwrap();
        let delayed: usize = conn.zcard(delayed_key(&topic)).await.unwrap();
        assert_eq!(length, 1);
        assert_eq!(delayed, 0);

        cleanup(&first, &topic).await;
    }
}
