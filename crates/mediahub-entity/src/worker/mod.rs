//! Worker node entity.

pub mod model;
pub mod status;

pub use model::{CreateWorker, ResourceSnapshot, WorkerNode, http_base_url};
pub use status::WorkerStatus;
