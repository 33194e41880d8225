//! Chunked uploads: session creation on the coordinator, chunk ingest and
//! merge on the assigned worker.

pub mod ingest;
pub mod session;

pub use ingest::{ChunkIngestService, ChunkMeta, ChunkOutcome};
pub use session::{NewUploadSession, UploadSessionService};
