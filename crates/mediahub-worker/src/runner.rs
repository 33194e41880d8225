//! Worker runner: main loop that consumes media tasks one at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use mediahub_core::config::QueueConfig;
use mediahub_entity::task::TaskEnvelope;

use crate::handlers::{TaskExecutionError, TaskHandler};
use crate::queue::{Delivery, TaskQueue};

/// Consumes the task queue with a single in-flight task.
///
/// Transient failures are re-published as the next attempt after an
/// exponential backoff until `max_attempts` is reached. Exhausted and
/// permanent failures are parked on the dead-letter stream when enabled.
/// Every entry is acknowledged once its outcome is settled.
pub struct WorkerRunner {
    queue: Arc<dyn TaskQueue>,
    handler: Arc<dyn TaskHandler>,
    config: QueueConfig,
}

impl std::fmt::Debug for WorkerRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRunner")
            .field("routing_key", &self.config.routing_key)
            .field("consumer", &self.config.consumer_name)
            .finish()
    }
}

impl WorkerRunner {
    /// Create a new worker runner.
    pub fn new(queue: Arc<dyn TaskQueue>, handler: Arc<dyn TaskHandler>, config: QueueConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Run until the cancel signal is received. A task in progress is
    /// finished before returning.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(
            routing_key = %self.config.routing_key,
            consumer = %self.config.consumer_name,
            poll_interval_ms = self.config.poll_interval_ms,
            max_attempts = self.config.max_attempts,
            "Task consumer started"
        );

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            if *cancel.borrow() {
                break;
            }
            let handled = self.poll_once().await;
            if handled {
                continue;
            }
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {}
            }
        }

        info!(consumer = %self.config.consumer_name, "Task consumer stopped");
    }

    /// Take and settle at most one entry. Returns whether one was taken.
    pub async fn poll_once(&self) -> bool {
        match self.queue.receive().await {
            Ok(Some(delivery)) => {
                self.process(&delivery).await;
                true
            }
            Ok(None) => {
                debug!("No tasks available");
                false
            }
            Err(e) => {
                error!(error = %e, "Failed to read from task queue");
                false
            }
        }
    }

    async fn process(&self, delivery: &Delivery) {
        let envelope: TaskEnvelope = match serde_json::from_str(&delivery.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(entry_id = %delivery.id, error = %e, "Undecodable task payload, dropping");
                self.ack(delivery).await;
                return;
            }
        };

        info!(
            entry_id = %delivery.id,
            task_id = %envelope.id,
            action = envelope.task.action(),
            video_id = %envelope.task.video_id(),
            attempt = envelope.attempt,
            max_attempts = self.config.max_attempts,
            "Processing task"
        );

        match self.handler.handle(&envelope.task).await {
            Ok(()) => {
                info!(task_id = %envelope.id, "Task completed");
                self.ack(delivery).await;
            }
            Err(TaskExecutionError::Transient(msg)) if envelope.attempt < self.config.max_attempts => {
                let backoff = self.backoff(envelope.attempt);
                warn!(
                    task_id = %envelope.id,
                    attempt = envelope.attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %msg,
                    "Task failed (transient), retrying"
                );
                time::sleep(backoff).await;
                match self.queue.publish(&envelope.next_attempt()).await {
                    Ok(()) => self.ack(delivery).await,
                    // Left pending; redelivered when this consumer restarts.
                    Err(e) => error!(task_id = %envelope.id, error = %e, "Failed to re-publish task"),
                }
            }
            Err(err) => {
                let reason = err.to_string();
                error!(task_id = %envelope.id, attempt = envelope.attempt, error = %reason, "Task failed");
                if self.config.dead_letter {
                    if let Err(e) = self.queue.dead_letter(delivery, &reason).await {
                        error!(task_id = %envelope.id, error = %e, "Failed to dead-letter task");
                    }
                }
                self.ack(delivery).await;
            }
        }
    }

    /// `retry_backoff_ms · 2^(attempt-1)`.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(factor))
    }

    async fn ack(&self, delivery: &Delivery) {
        if let Err(e) = self.queue.ack(delivery).await {
            error!(entry_id = %delivery.id, error = %e, "Failed to acknowledge task");
        }
    }
}
