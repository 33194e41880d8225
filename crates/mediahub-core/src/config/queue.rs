//! Task queue configuration.

use serde::{Deserialize, Serialize};

/// Redis connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Prefix for every key MediaHub writes.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

/// Task consumer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Whether this node consumes tasks.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Routing key selecting the stream this node publishes to and consumes
    /// from. Empty means one derived from the node address, so tasks carrying
    /// node-local paths stay on the node that produced them.
    #[serde(default)]
    pub routing_key: String,
    /// Consumer group name.
    #[serde(default = "default_group")]
    pub consumer_group: String,
    /// Consumer name inside the group. Empty means derived from the node address.
    #[serde(default)]
    pub consumer_name: String,
    /// Pause between polls when the queue is empty.
    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,
    /// Total delivery attempts for a task failing with a transient error.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles with every further attempt.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Append exhausted or permanently failed tasks to a dead-letter stream.
    #[serde(default = "default_true")]
    pub dead_letter: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            routing_key: String::new(),
            consumer_group: default_group(),
            consumer_name: String::new(),
            poll_interval_ms: default_poll_ms(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_backoff_ms(),
            dead_letter: default_true(),
        }
    }
}

impl QueueConfig {
    /// Fill an unset routing key and consumer name from the address this
    /// node advertises.
    pub fn resolve_for_node(&mut self, public_address: &str) {
        let node = address_token(public_address);
        if self.routing_key.trim().is_empty() {
            self.routing_key = format!("video.{node}");
        }
        if self.consumer_name.trim().is_empty() {
            self.consumer_name = format!("consumer-{node}");
        }
    }
}

/// `10.0.0.9:8081` becomes `10.0.0.9_8081`.
fn address_token(address: &str) -> String {
    let bare = address.trim();
    let bare = bare
        .strip_prefix("http://")
        .or_else(|| bare.strip_prefix("https://"))
        .unwrap_or(bare)
        .trim_end_matches('/');
    bare.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "mediahub:".to_string()
}

fn default_true() -> bool {
    true
}

fn default_group() -> String {
    "transcoders".to_string()
}

fn default_poll_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    2000
}
