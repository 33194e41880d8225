//! # mediahub-database
//!
//! PostgreSQL connection management, the store traits the service layer
//! depends on, and two implementations of them: Postgres repositories and
//! in-memory stores.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{LivestreamKeyStore, LivestreamStore, UploadSessionStore, VideoStore, WorkerStore};
