//! Upload session model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use mediahub_core::types::{UploadSessionId, UserId, VideoId};

use super::status::UploadStatus;
use crate::worker::http_base_url;

/// A per-upload session bound to one worker node.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UploadSession {
    /// Unique session identifier.
    pub id: UploadSessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name; names the per-user storage directory.
    pub username: String,
    /// Address of the worker that receives the chunks.
    pub server_address: String,
    /// Declared number of chunks, known once the first chunk arrives.
    pub total_chunks: Option<i32>,
    /// Declared original file name.
    pub file_name: Option<String>,
    /// Declared MIME type.
    pub file_type: Option<String>,
    /// Declared total size in bytes.
    pub file_size: Option<i64>,
    /// Declared duration in seconds.
    pub duration: Option<f64>,
    /// Video created by the merge.
    pub video_id: Option<VideoId>,
    /// Current status.
    pub status: UploadStatus,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last changed.
    pub updated_at: DateTime<Utc>,
}

impl UploadSession {
    /// Whether `user_id` owns this session.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// URL the client posts chunks to.
    pub fn destination_url(&self) -> String {
        format!(
            "{}/api/uploads/{}",
            http_base_url(&self.server_address),
            self.id
        )
    }
}

/// Data required to open an upload session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUploadSession {
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name.
    pub username: String,
    /// Worker selected by the balancer.
    pub server_address: String,
    /// Optional metadata the client already knows.
    pub file_name: Option<String>,
    /// Optional MIME type.
    pub file_type: Option<String>,
    /// Optional total size.
    pub file_size: Option<i64>,
}

/// Final metadata recorded when the merge succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteUpload {
    /// Number of chunks merged.
    pub total_chunks: i32,
    /// File name.
    pub file_name: String,
    /// MIME type.
    pub file_type: Option<String>,
    /// Size in bytes.
    pub file_size: i64,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Video created from the merged file.
    pub video_id: VideoId,
}
