//! Publishing side of the media task queue.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use mediahub_core::result::AppResult;
use mediahub_entity::task::{MediaTask, TaskEnvelope};

/// Transport that appends task envelopes to the durable queue.
#[async_trait]
pub trait TaskPublisher: Send + Sync + 'static {
    /// Publish one envelope. `Ok` means the broker confirmed it.
    async fn publish(&self, envelope: &TaskEnvelope) -> AppResult<()>;
}

/// Fire-and-log front end over a [`TaskPublisher`].
///
/// Dispatch never fails the caller: local state already written stays
/// written and a lost publish surfaces later as a missing rendition.
#[derive(Clone)]
pub struct TaskDispatcher {
    publisher: Arc<dyn TaskPublisher>,
}

impl std::fmt::Debug for TaskDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskDispatcher").finish()
    }
}

impl TaskDispatcher {
    /// Creates a dispatcher.
    pub fn new(publisher: Arc<dyn TaskPublisher>) -> Self {
        Self { publisher }
    }

    /// Publish `task` as a first attempt. Returns whether the broker confirmed it.
    pub async fn dispatch(&self, task: MediaTask) -> bool {
        let envelope = TaskEnvelope::new(task);
        match self.publisher.publish(&envelope).await {
            Ok(()) => {
                info!(
                    task_id = %envelope.id,
                    action = envelope.task.action(),
                    video_id = %envelope.task.video_id(),
                    "Task published"
                );
                true
            }
            Err(e) => {
                warn!(
                    task_id = %envelope.id,
                    action = envelope.task.action(),
                    video_id = %envelope.task.video_id(),
                    error = %e,
                    "Failed to publish task"
                );
                false
            }
        }
    }
}
