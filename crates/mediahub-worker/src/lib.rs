//! Media task processing for MediaHub worker nodes.
//!
//! This crate provides:
//! - A task queue abstraction over Redis Streams, with an in-memory
//!   implementation for tests
//! - A publisher adapter used by the service layer to enqueue tasks
//! - Task handlers for transcoding and deletion
//! - A runner that consumes one task at a time with bounded retries

pub mod handlers;
pub mod queue;
pub mod runner;

pub use handlers::{MediaTaskHandler, TaskExecutionError, TaskHandler};
pub use queue::{Delivery, MemoryTaskQueue, QueuePublisher, RedisStreamQueue, TaskQueue};
pub use runner::WorkerRunner;
