//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mediahub_core::types::{LivestreamId, LivestreamKeyId, UploadSessionId, VideoId, WorkerId};
use mediahub_entity::livestream::{Livestream, LivestreamKey};
use mediahub_entity::upload::{UploadSession, UploadStatus};
use mediahub_entity::video::{Privacy, Video};
use mediahub_entity::worker::{WorkerNode, WorkerStatus};
use mediahub_service::{ChunkOutcome, StreamInfo};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Wraps a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` when the process answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// `coordinator` or `worker`.
    pub role: String,
}

/// A registered worker node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerResponse {
    pub id: WorkerId,
    pub name: String,
    pub address: String,
    pub status: WorkerStatus,
    pub ram_total: Option<f64>,
    pub ram_used_pct: Option<f64>,
    pub cpu_cores: Option<f64>,
    pub cpu_used_pct: Option<f64>,
    pub disk_total: Option<f64>,
    pub disk_used_pct: Option<f64>,
    /// Uploads and livestreams currently counted against the node.
    pub current_load: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WorkerNode> for ServerResponse {
    fn from(w: WorkerNode) -> Self {
        Self {
            id: w.id,
            name: w.name,
            address: w.address,
            status: w.status,
            ram_total: w.specification.ram_total,
            ram_used_pct: w.specification.ram_used_pct,
            cpu_cores: w.specification.cpu_cores,
            cpu_used_pct: w.specification.cpu_used_pct,
            disk_total: w.specification.disk_total,
            disk_used_pct: w.specification.disk_used_pct,
            current_load: w.current_load,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

/// Worker picked by the balancer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResponse {
    /// Address of the selected worker.
    pub address: String,
}

/// A freshly opened upload session and where to send its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionCreatedResponse {
    pub session_id: UploadSessionId,
    pub server_address: String,
    pub destination_url: String,
}

impl From<UploadSession> for UploadSessionCreatedResponse {
    fn from(s: UploadSession) -> Self {
        Self {
            destination_url: s.destination_url(),
            session_id: s.id,
            server_address: s.server_address,
        }
    }
}

/// Upload session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSessionResponse {
    pub id: UploadSessionId,
    pub username: String,
    pub server_address: String,
    pub status: UploadStatus,
    pub total_chunks: Option<i32>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub duration: Option<f64>,
    pub video_id: Option<VideoId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UploadSession> for UploadSessionResponse {
    fn from(s: UploadSession) -> Self {
        Self {
            id: s.id,
            username: s.username,
            server_address: s.server_address,
            status: s.status,
            total_chunks: s.total_chunks,
            file_name: s.file_name,
            file_type: s.file_type,
            file_size: s.file_size,
            duration: s.duration,
            video_id: s.video_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Reply to one uploaded chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkUploadResponse {
    /// The chunk is stored; more are expected.
    #[serde(rename_all = "camelCase")]
    ChunkReceived { chunk_index: u32, total_chunks: u32 },
    /// The file is assembled into a video.
    #[serde(rename_all = "camelCase")]
    Completed {
        video_id: VideoId,
        transcodes_queued: usize,
    },
}

impl From<ChunkOutcome> for ChunkUploadResponse {
    fn from(outcome: ChunkOutcome) -> Self {
        match outcome {
            ChunkOutcome::Stored {
                chunk_index,
                total_chunks,
            } => Self::ChunkReceived {
                chunk_index,
                total_chunks,
            },
            ChunkOutcome::Completed {
                video_id,
                transcodes,
            } => Self::Completed {
                video_id,
                transcodes_queued: transcodes,
            },
        }
    }
}

/// A video record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: VideoId,
    pub username: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: f64,
    pub resolutions: Vec<String>,
    pub server_locations: Vec<String>,
    pub privacy: Privacy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(v: Video) -> Self {
        Self {
            id: v.id,
            username: v.username,
            title: v.title,
            description: v.description,
            thumbnail: v.thumbnail,
            duration: v.duration,
            resolutions: v.resolutions,
            server_locations: v.server_locations,
            privacy: v.privacy,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// The caller's own livestream key, secret included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivestreamKeyResponse {
    pub id: LivestreamKeyId,
    pub username: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub stream_key: String,
    pub is_live: bool,
    pub current_livestream_id: Option<LivestreamId>,
    /// Playback URL while live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_endpoint: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl LivestreamKeyResponse {
    /// Builds the response from a key and its optional playback URL.
    pub fn new(key: LivestreamKey, stream_endpoint: Option<String>) -> Self {
        Self {
            id: key.id,
            username: key.username,
            title: key.title,
            description: key.description,
            stream_key: key.stream_key,
            is_live: key.is_live,
            current_livestream_id: key.current_livestream_id,
            stream_endpoint,
            updated_at: key.updated_at,
        }
    }
}

/// Everything a broadcaster needs to go live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfoResponse {
    pub stream_key: String,
    pub server_address: String,
    pub ingest_url: String,
    pub playback_url: String,
}

impl From<StreamInfo> for StreamInfoResponse {
    fn from(info: StreamInfo) -> Self {
        Self {
            stream_key: info.key.stream_key,
            server_address: info.server_address,
            ingest_url: info.ingest_url,
            playback_url: info.playback_url,
        }
    }
}

/// Whether a user is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusResponse {
    pub username: String,
    pub is_live: bool,
}

/// Public view of a user's channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub username: String,
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_endpoint: Option<String>,
}

/// A livestream session or recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivestreamResponse {
    pub id: LivestreamId,
    pub username: String,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub duration: f64,
    pub server_location: String,
    pub privacy: Privacy,
    pub dvr_path: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<Livestream> for LivestreamResponse {
    fn from(l: Livestream) -> Self {
        Self {
            id: l.id,
            username: l.username,
            title: l.title,
            description: l.description,
            thumbnail: l.thumbnail,
            duration: l.duration,
            server_location: l.server_location,
            privacy: l.privacy,
            dvr_path: l.dvr_path,
            uploaded_at: l.uploaded_at,
            ended_at: l.ended_at,
        }
    }
}

/// A task accepted onto the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAcceptedResponse {
    pub action: String,
    pub video_id: VideoId,
}
