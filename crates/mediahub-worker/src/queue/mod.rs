//! Durable task queue.
//!
//! Delivery is at-least-once: an entry stays pending until it is
//! acknowledged, and a consumer restarting re-reads its own pending
//! entries first.

pub mod memory;
pub mod streams;

use std::sync::Arc;

use async_trait::async_trait;

use mediahub_core::result::AppResult;
use mediahub_entity::task::TaskEnvelope;
use mediahub_service::TaskPublisher;

pub use memory::MemoryTaskQueue;
pub use streams::RedisStreamQueue;

/// One entry read from the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Broker-assigned entry id, used to acknowledge.
    pub id: String,
    /// Raw JSON envelope.
    pub payload: String,
}

/// A routed, durable queue of task envelopes.
#[async_trait]
pub trait TaskQueue: Send + Sync + 'static {
    /// Append an envelope. `Ok` means the broker stored it.
    async fn publish(&self, envelope: &TaskEnvelope) -> AppResult<()>;

    /// Take the next entry for this consumer, if any. Does not block.
    async fn receive(&self) -> AppResult<Option<Delivery>>;

    /// Mark an entry as handled.
    async fn ack(&self, delivery: &Delivery) -> AppResult<()>;

    /// Park an entry that will not be retried.
    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> AppResult<()>;
}

/// Exposes a [`TaskQueue`] to the service layer as a [`TaskPublisher`].
#[derive(Clone)]
pub struct QueuePublisher {
    queue: Arc<dyn TaskQueue>,
}

impl std::fmt::Debug for QueuePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuePublisher").finish()
    }
}

impl QueuePublisher {
    /// Wrap a queue.
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl TaskPublisher for QueuePublisher {
    async fn publish(&self, envelope: &TaskEnvelope) -> AppResult<()> {
        self.queue.publish(envelope).await
    }
}
