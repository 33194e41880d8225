//! In-memory implementations of the store traits.
//!
//! Backed by `dashmap`; every compound mutation runs under the entry's
//! shard lock, so the atomicity guarantees match the Postgres stores.
//! Used by tests and single-process development setups.

pub mod livestream;
pub mod upload;
pub mod video;
pub mod worker;

pub use livestream::{MemoryLivestreamKeyStore, MemoryLivestreamStore};
pub use upload::MemoryUploadSessionStore;
pub use video::MemoryVideoStore;
pub use worker::MemoryWorkerStore;
