//! # mediahub-service
//!
//! Business logic service layer for MediaHub. Services receive their
//! stores, storage helpers and collaborators as `Arc` references at
//! construction time, so the API layer, the queue consumer and tests can
//! wire them against Postgres or in-memory stores alike.

pub mod context;
pub mod dispatch;
pub mod livestream;
pub mod registry;
pub mod upload;
pub mod video;

pub use context::Caller;
pub use dispatch::{TaskDispatcher, TaskPublisher};
pub use livestream::{
    ChannelState, DvrOutcome, HookReply, KeyOverview, LivestreamHookService, LivestreamKeyService,
    StreamEndpoints, StreamInfo,
};
pub use registry::{LoadBalancer, MetricsCollector, MetricsSource, PrometheusMetricsSource, RegistryService};
pub use upload::{ChunkIngestService, ChunkMeta, ChunkOutcome, NewUploadSession, UploadSessionService};
pub use video::{HttpWorkerClient, LocalMediaService, VideoService, WorkerClient};
