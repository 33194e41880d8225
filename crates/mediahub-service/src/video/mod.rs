//! Video lookup, rendition bookkeeping and deletion across nodes.

pub mod client;
pub mod local;
pub mod service;

pub use client::{HttpWorkerClient, WorkerClient};
pub use local::LocalMediaService;
pub use service::VideoService;
