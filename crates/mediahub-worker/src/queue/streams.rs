//! Redis Streams transport.
//!
//! Entries live in `<prefix>tasks:<routing_key>` with the JSON envelope in
//! the `payload` field and are consumed through a consumer group. Parked
//! entries go to the same key suffixed with `:dead`.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::Client;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use tokio::sync::Mutex;
use tracing::{debug, info};

use mediahub_core::config::{QueueConfig, RedisConfig};
use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_entity::task::TaskEnvelope;

use super::{Delivery, TaskQueue};

/// Stream key for a routing key.
pub fn stream_key(prefix: &str, routing_key: &str) -> String {
    format!("{prefix}tasks:{routing_key}")
}

/// Dead-letter stream key for a routing key.
pub fn dead_letter_key(prefix: &str, routing_key: &str) -> String {
    format!("{}:dead", stream_key(prefix, routing_key))
}

struct ConsumerState {
    conn: ConnectionManager,
    /// Still draining entries delivered before a restart.
    recovering: bool,
}

/// [`TaskQueue`] over a Redis stream and consumer group.
pub struct RedisStreamQueue {
    publisher: ConnectionManager,
    consumer: Mutex<ConsumerState>,
    stream: String,
    dead_stream: String,
    group: String,
    consumer_name: String,
}

impl std::fmt::Debug for RedisStreamQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStreamQueue")
            .field("stream", &self.stream)
            .field("group", &self.group)
            .field("consumer", &self.consumer_name)
            .finish()
    }
}

fn map_err(e: redis::RedisError) -> AppError {
    AppError::with_source(ErrorKind::Queue, format!("Redis error: {e}"), e)
}

impl RedisStreamQueue {
    /// Connect and make sure the consumer group exists.
    pub async fn connect(redis: &RedisConfig, queue: &QueueConfig) -> AppResult<Self> {
        info!(routing_key = %queue.routing_key, "Connecting task queue to Redis");

        let client = Client::open(redis.url.as_str()).map_err(|e| {
            AppError::with_source(ErrorKind::Queue, "Failed to create Redis client", e)
        })?;
        let publisher = ConnectionManager::new(client.clone()).await.map_err(|e| {
            AppError::with_source(ErrorKind::Queue, "Failed to connect to Redis", e)
        })?;
        let consumer = ConnectionManager::new(client).await.map_err(|e| {
            AppError::with_source(ErrorKind::Queue, "Failed to connect to Redis", e)
        })?;

        let this = Self {
            publisher,
            consumer: Mutex::new(ConsumerState {
                conn: consumer,
                recovering: true,
            }),
            stream: stream_key(&redis.key_prefix, &queue.routing_key),
            dead_stream: dead_letter_key(&redis.key_prefix, &queue.routing_key),
            group: queue.consumer_group.clone(),
            consumer_name: queue.consumer_name.clone(),
        };
        this.ensure_group().await?;

        info!(stream = %this.stream, group = %this.group, "Task queue ready");
        Ok(this)
    }

    /// `XGROUP CREATE ... MKSTREAM`, tolerating an existing group.
    async fn ensure_group(&self) -> AppResult<()> {
        let mut conn = self.publisher.clone();
        let created: redis::RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.stream)
            .arg(&self.group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;
        match created {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(map_err(e)),
        }
    }
}

#[async_trait]
impl TaskQueue for RedisStreamQueue {
    async fn publish(&self, envelope: &TaskEnvelope) -> AppResult<()> {
        let payload = serde_json::to_string(envelope)?;
        let mut conn = self.publisher.clone();
        let entry_id: String = conn
            .xadd(&self.stream, "*", &[("payload", payload.as_str())])
            .await
            .map_err(map_err)?;
        debug!(stream = %self.stream, entry_id = %entry_id, "Task appended");
        Ok(())
    }

    async fn receive(&self) -> AppResult<Option<Delivery>> {
        let mut state = self.consumer.lock().await;
        loop {
            let start = if state.recovering { "0" } else { ">" };
            let options = StreamReadOptions::default()
                .group(&self.group, &self.consumer_name)
                .count(1);
            let reply: Option<StreamReadReply> = state
                .conn
                .xread_options(&[&self.stream], &[start], &options)
                .await
                .map_err(map_err)?;

            let entry = reply
                .and_then(|r| r.keys.into_iter().next())
                .and_then(|k| k.ids.into_iter().next());

            match entry {
                Some(entry) => {
                    let payload: String = entry.get("payload").unwrap_or_default();
                    return Ok(Some(Delivery {
                        id: entry.id,
                        payload,
                    }));
                }
                None if state.recovering => {
                    debug!(stream = %self.stream, "No pending entries left, reading new ones");
                    state.recovering = false;
                }
                None => return Ok(None),
            }
        }
    }

    async fn ack(&self, delivery: &Delivery) -> AppResult<()> {
        let mut conn = self.publisher.clone();
        let _: i64 = conn
            .xack(&self.stream, &self.group, &[delivery.id.as_str()])
            .await
            .map_err(map_err)?;
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> AppResult<()> {
        let mut conn = self.publisher.clone();
        let _: String = conn
            .xadd(
                &self.dead_stream,
                "*",
                &[
                    ("payload", delivery.payload.as_str()),
                    ("reason", reason),
                    ("source_id", delivery.id.as_str()),
                ],
            )
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_keys() {
        assert_eq!(
            stream_key("mediahub:", "video.node-a"),
            "mediahub:tasks:video.node-a"
        );
        assert_eq!(
            dead_letter_key("mediahub:", "video.node-a"),
            "mediahub:tasks:video.node-a:dead"
        );
    }
}
