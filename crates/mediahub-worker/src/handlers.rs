//! Task handlers: turn a decoded [`MediaTask`] into work on this node.

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_entity::task::MediaTask;
use mediahub_service::LocalMediaService;

/// Error from task execution.
#[derive(Debug, thiserror::Error)]
pub enum TaskExecutionError {
    /// Permanent failure; do not retry.
    #[error("Permanent task failure: {0}")]
    Permanent(String),

    /// Transient failure; may retry.
    #[error("Transient task failure: {0}")]
    Transient(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl TaskExecutionError {
    /// Classify a service error by whether a later attempt could succeed.
    pub fn classify(err: AppError) -> Self {
        match err.kind {
            ErrorKind::Storage
            | ErrorKind::Database
            | ErrorKind::Queue
            | ErrorKind::ServiceUnavailable => Self::Transient(err.to_string()),
            ErrorKind::ExternalService | ErrorKind::Validation | ErrorKind::NotFound => {
                Self::Permanent(err.to_string())
            }
            _ => Self::Internal(err),
        }
    }

    /// Whether another attempt is worthwhile.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Executes one task.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Run `task` to completion.
    async fn handle(&self, task: &MediaTask) -> Result<(), TaskExecutionError>;
}

/// Handles TRANSCODE and DELETE against this node's storage.
#[derive(Debug, Clone)]
pub struct MediaTaskHandler {
    media: LocalMediaService,
}

impl MediaTaskHandler {
    /// Creates the handler.
    pub fn new(media: LocalMediaService) -> Self {
        Self { media }
    }
}

#[async_trait]
impl TaskHandler for MediaTaskHandler {
    async fn handle(&self, task: &MediaTask) -> Result<(), TaskExecutionError> {
        match task {
            MediaTask::Transcode {
                video_id,
                source_path,
                output_dir,
                resolution,
            } => self
                .media
                .transcode(
                    *video_id,
                    Path::new(source_path),
                    Path::new(output_dir),
                    *resolution,
                )
                .await
                .map_err(TaskExecutionError::classify),
            MediaTask::Delete { video_id, username } => {
                let removed = self
                    .media
                    .delete_local(*video_id, username)
                    .await
                    .map_err(TaskExecutionError::classify)?;
                if removed {
                    info!(video_id = %video_id, "Delete task completed");
                } else {
                    warn!(video_id = %video_id, user = %username, "Delete task rejected");
                }
                Ok(())
            }
        }
    }
}
