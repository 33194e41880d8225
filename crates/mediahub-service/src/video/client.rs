//! Calls from the coordinator to worker nodes.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use mediahub_core::config::FanoutConfig;
use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_core::types::VideoId;
use mediahub_entity::worker::http_base_url;

/// Requests a worker node can accept from the coordinator.
#[async_trait]
pub trait WorkerClient: Send + Sync + 'static {
    /// Ask the node at `location` to enqueue removal of a video's files.
    /// `Ok` means the node accepted the request, not that files are gone.
    async fn request_delete(&self, location: &str, video_id: VideoId, username: &str)
    -> AppResult<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    video_id: VideoId,
    username: &'a str,
}

/// [`WorkerClient`] over the workers' HTTP API.
#[derive(Debug, Clone)]
pub struct HttpWorkerClient {
    client: reqwest::Client,
}

impl HttpWorkerClient {
    /// Creates a client with the configured per-request timeout.
    pub fn new(config: &FanoutConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn request_delete(
        &self,
        location: &str,
        video_id: VideoId,
        username: &str,
    ) -> AppResult<()> {
        let url = format!("{}/api/tasks/delete", http_base_url(location));
        debug!(url = %url, video_id = %video_id, "Requesting remote delete");

        let response = self
            .client
            .post(&url)
            .json(&DeleteRequest { video_id, username })
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Delete request to {location} failed"),
                    e,
                )
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AppError::external_service(format!(
                "Worker {location} rejected delete with status {status}"
            )))
        }
    }
}
