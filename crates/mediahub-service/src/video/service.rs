//! Video reads and the coordinator side of deletion.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::VideoId;
use mediahub_database::store::VideoStore;
use mediahub_entity::video::Video;

use super::client::WorkerClient;
use crate::context::Caller;

/// Reads videos and fans deletions out to the nodes holding them.
#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoStore>,
    workers: Arc<dyn WorkerClient>,
}

impl std::fmt::Debug for VideoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoService").finish()
    }
}

impl VideoService {
    /// Creates a video service.
    pub fn new(videos: Arc<dyn VideoStore>, workers: Arc<dyn WorkerClient>) -> Self {
        Self { videos, workers }
    }

    /// Fetch a video.
    pub async fn get(&self, id: VideoId) -> AppResult<Video> {
        self.videos
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))
    }

    /// Delete a video owned by the caller.
    ///
    /// The record is removed first, then every distinct location is asked
    /// to remove its files. Locations that refuse or cannot be reached are
    /// reported together; the record stays deleted.
    #[instrument(skip(self, caller), fields(user = %caller.username))]
    pub async fn delete(&self, caller: &Caller, id: VideoId) -> AppResult<()> {
        let video = self.get(id).await?;
        if !video.is_owned_by(&caller.username) {
            return Err(AppError::authorization("You do not own this video"));
        }

        self.videos.delete(id).await?;
        let locations = video.distinct_locations();
        info!(video_id = %id, locations = locations.len(), "Video record deleted");

        let results = join_all(locations.iter().map(|loc| {
            let workers = Arc::clone(&self.workers);
            let username = caller.username.clone();
            async move { workers.request_delete(loc, id, &username).await }
        }))
        .await;

        let failed: Vec<&str> = locations
            .iter()
            .zip(results)
            .filter_map(|(loc, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!(video_id = %id, location = %loc, error = %e, "Delete dispatch failed");
                    Some(loc.as_str())
                }
            })
            .collect();

        if failed.is_empty() {
            Ok(())
        } else {
            Err(AppError::external_service(format!(
                "Failed to dispatch delete task to: {}",
                failed.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mediahub_core::error::ErrorKind;
    use mediahub_core::types::UserId;
    use mediahub_database::memory::MemoryVideoStore;
    use mediahub_entity::video::{CreateVideo, Privacy};

    use super::*;

    #[derive(Default)]
    struct RecordingClient {
        calls: Mutex<Vec<String>>,
        unreachable: Vec<&'static str>,
    }

    #[async_trait]
    impl WorkerClient for RecordingClient {
        async fn request_delete(
            &self,
            location: &str,
            _video_id: VideoId,
            username: &str,
        ) -> AppResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{location}:{username}"));
            if self.unreachable.contains(&location) {
                Err(AppError::external_service("connection refused"))
            } else {
                Ok(())
            }
        }
    }

    async fn seeded(videos: &MemoryVideoStore, owner: &Caller) -> VideoId {
        let id = VideoId::new();
        videos
            .create(&CreateVideo {
                id,
                user_id: owner.user_id,
                username: owner.username.clone(),
                title: "clip.mp4".into(),
                duration: 12.0,
                server_location: "node-a:8081".into(),
                privacy: Privacy::Public,
            })
            .await
            .unwrap();
        videos.add_rendition(id, "480", "node-b:8081").await.unwrap();
        videos.add_rendition(id, "360", "node-a:8081").await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_delete_fans_out_once_per_location() {
        let videos = Arc::new(MemoryVideoStore::new());
        let client = Arc::new(RecordingClient::default());
        let service = VideoService::new(videos.clone(), client.clone());
        let owner = Caller::new(UserId::new(), "alice");
        let id = seeded(&videos, &owner).await;

        service.delete(&owner, id).await.unwrap();

        let mut calls = client.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["node-a:8081:alice", "node-b:8081:alice"]);
        assert!(videos.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_unreachable_locations() {
        let videos = Arc::new(MemoryVideoStore::new());
        let client = Arc::new(RecordingClient {
            unreachable: vec!["node-b:8081"],
            ..Default::default()
        });
        let service = VideoService::new(videos.clone(), client);
        let owner = Caller::new(UserId::new(), "alice");
        let id = seeded(&videos, &owner).await;

        let err = service.delete(&owner, id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ExternalService);
        assert!(err.message.contains("node-b:8081"));
        assert!(!err.message.contains("node-a:8081"));
        // The record is gone regardless.
        assert!(videos.find_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let videos = Arc::new(MemoryVideoStore::new());
        let client = Arc::new(RecordingClient::default());
        let service = VideoService::new(videos.clone(), client.clone());
        let owner = Caller::new(UserId::new(), "alice");
        let id = seeded(&videos, &owner).await;

        let err = service
            .delete(&Caller::new(UserId::new(), "mallory"), id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(client.calls.lock().unwrap().is_empty());
        assert!(videos.find_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_missing_video() {
        let service = VideoService::new(
            Arc::new(MemoryVideoStore::new()),
            Arc::new(RecordingClient::default()),
        );
        let err = service.get(VideoId::new()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
