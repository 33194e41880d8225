//! Task payloads exchanged over the media task queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mediahub_core::types::VideoId;

use crate::video::Resolution;

/// A unit of work for a worker's task consumer, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaTask {
    /// Produce one rendition of an uploaded video.
    #[serde(rename_all = "camelCase")]
    Transcode {
        /// Video the rendition belongs to.
        video_id: VideoId,
        /// Raw uploaded file.
        #[serde(alias = "videoPath")]
        source_path: String,
        /// Directory receiving the playlist and segments.
        output_dir: String,
        /// Target rung.
        resolution: Resolution,
    },
    /// Remove a video's files from this node and its record.
    #[serde(rename_all = "camelCase", alias = "DELETE_VIDEO")]
    Delete {
        /// Video to remove.
        video_id: VideoId,
        /// User requesting the removal; must own the video.
        username: String,
    },
}

impl MediaTask {
    /// The `action` discriminator, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Transcode { .. } => "TRANSCODE",
            Self::Delete { .. } => "DELETE",
        }
    }

    /// Video the task refers to.
    pub fn video_id(&self) -> VideoId {
        match self {
            Self::Transcode { video_id, .. } | Self::Delete { video_id, .. } => *video_id,
        }
    }
}

/// Delivery wrapper around a [`MediaTask`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEnvelope {
    /// Stable id across redeliveries of the same task.
    pub id: Uuid,
    /// 1-based delivery attempt.
    pub attempt: u32,
    /// When the first attempt was enqueued.
    pub enqueued_at: DateTime<Utc>,
    /// The task itself.
    pub task: MediaTask,
}

impl TaskEnvelope {
    /// Wrap a task for its first delivery.
    pub fn new(task: MediaTask) -> Self {
        Self {
            id: Uuid::new_v4(),
            attempt: 1,
            enqueued_at: Utc::now(),
            task,
        }
    }

    /// The same task, scheduled for its next attempt.
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }
}
