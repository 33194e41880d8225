//! Chunked upload session entity.

pub mod model;
pub mod status;

pub use model::{CompleteUpload, CreateUploadSession, UploadSession};
pub use status::UploadStatus;
