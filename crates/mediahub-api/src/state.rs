//! Application state shared across handlers.
//!
//! Each node role gets its own state; services are cheap to clone since
//! they hold their stores behind `Arc`.

use std::sync::Arc;

use mediahub_core::config::AppConfig;
use mediahub_service::{
    ChunkIngestService, LivestreamHookService, LivestreamKeyService, LoadBalancer,
    RegistryService, TaskDispatcher, UploadSessionService, VideoService,
};

/// State of a coordinator node.
#[derive(Debug, Clone)]
pub struct CoordinatorState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Worker registry CRUD.
    pub registry: RegistryService,
    /// Worker selection.
    pub balancer: LoadBalancer,
    /// Upload session creation and lookup.
    pub uploads: UploadSessionService,
    /// Video lookup and fan-out delete.
    pub videos: VideoService,
    /// Livestream keys, channel state and recordings.
    pub livestreams: LivestreamKeyService,
}

/// State of a worker node.
#[derive(Debug, Clone)]
pub struct WorkerState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Chunk ingest and merge.
    pub ingest: ChunkIngestService,
    /// Task queue front end.
    pub dispatcher: TaskDispatcher,
    /// Streaming-server webhooks.
    pub hooks: LivestreamHookService,
}
