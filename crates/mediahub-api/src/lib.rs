//! # mediahub-api
//!
//! HTTP API layer for MediaHub built on Axum.
//!
//! A coordinator node serves the registry, upload-session, video and
//! livestream-key routes; a worker node serves chunk ingest, the task
//! endpoint and the streaming-server webhooks. Both expose `/api/health`.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::{coordinator_router, worker_router};
pub use state::{CoordinatorState, WorkerState};
