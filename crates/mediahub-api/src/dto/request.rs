//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use mediahub_core::types::VideoId;

/// Register a worker node.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterServerRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "Server name is required"))]
    pub name: String,
    /// Network address (`host` or `host:port`).
    #[validate(length(min = 1, max = 255, message = "Server address is required"))]
    #[serde(alias = "ip")]
    pub address: String,
}

/// Change a worker's name and address.
pub type UpdateServerRequest = RegisterServerRequest;

/// Open an upload session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadSessionRequest {
    /// Original file name.
    #[validate(length(max = 255))]
    pub file_name: Option<String>,
    /// MIME type.
    pub file_type: Option<String>,
    /// Total size in bytes.
    #[validate(range(min = 0, message = "File size must not be negative"))]
    pub file_size: Option<i64>,
}

/// Title and description of the caller's channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LivestreamSetupRequest {
    /// Channel title.
    #[validate(length(max = 200))]
    pub title: Option<String>,
    /// Channel description.
    #[validate(length(max = 5000))]
    pub description: Option<String>,
}

/// Edit a recorded or running livestream.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateLivestreamRequest {
    /// New title.
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    /// New description.
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
}

/// Query string of the recordings listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingsQuery {
    /// Maximum number of recordings; server default when absent.
    pub limit: Option<u32>,
}

/// Delete request fanned out from the coordinator to each worker.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTaskRequest {
    /// Video to remove.
    pub video_id: VideoId,
    /// Owner of the video.
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
}

/// Webhook body posted by the streaming server.
///
/// Only `stream` and `file` drive behavior; the rest is logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamHookRequest {
    /// Callback name (`on_publish`, `on_unpublish`, `on_dvr`).
    pub action: Option<String>,
    /// Streaming-server client id.
    pub client_id: Option<String>,
    /// Client IP.
    pub ip: Option<String>,
    /// Application name.
    pub app: Option<String>,
    /// Stream name, i.e. the stream key.
    pub stream: Option<String>,
    /// Raw path of the recorded file, DVR only.
    pub file: Option<String>,
}
