//! PostgreSQL implementations of the store traits.

pub mod livestream;
pub mod upload;
pub mod video;
pub mod worker;

pub use livestream::{LivestreamKeyRepository, LivestreamRepository};
pub use upload::UploadSessionRepository;
pub use video::VideoRepository;
pub use worker::WorkerRepository;
