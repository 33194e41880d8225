//! In-memory videos.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use mediahub_core::result::AppResult;
use mediahub_core::types::VideoId;
use mediahub_entity::video::{CreateVideo, Video};

use crate::store::VideoStore;

/// Videos held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryVideoStore {
    videos: DashMap<VideoId, Video>,
}

impl MemoryVideoStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored videos.
    pub fn len(&self) -> usize {
        self.videos.len()
    }

    /// Whether no videos are stored.
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

fn union_into(set: &mut Vec<String>, value: &str) {
    if !set.iter().any(|v| v == value) {
        set.push(value.to_string());
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn create(&self, data: &CreateVideo) -> AppResult<Video> {
        let now = Utc::now();
        let video = Video {
            id: data.id,
            user_id: data.user_id,
            username: data.username.clone(),
            title: data.title.clone(),
            description: None,
            thumbnail: None,
            duration: data.duration,
            resolutions: Vec::new(),
            server_locations: vec![data.server_location.clone()],
            privacy: data.privacy,
            created_at: now,
            updated_at: now,
        };
        self.videos.insert(video.id, video.clone());
        Ok(video)
    }

    async fn find_by_id(&self, id: VideoId) -> AppResult<Option<Video>> {
        Ok(self.videos.get(&id).map(|v| v.clone()))
    }

    async fn set_thumbnail(&self, id: VideoId, url: &str) -> AppResult<()> {
        if let Some(mut v) = self.videos.get_mut(&id) {
            v.thumbnail = Some(url.to_string());
            v.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn add_rendition(
        &self,
        id: VideoId,
        resolution: &str,
        location: &str,
    ) -> AppResult<bool> {
        let Some(mut v) = self.videos.get_mut(&id) else {
            return Ok(false);
        };
        union_into(&mut v.resolutions, resolution);
        union_into(&mut v.server_locations, location);
        v.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete(&self, id: VideoId) -> AppResult<bool> {
        Ok(self.videos.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mediahub_core::types::UserId;
    use mediahub_entity::video::Privacy;

    use super::*;

    async fn seeded() -> (Arc<MemoryVideoStore>, VideoId) {
        let store = Arc::new(MemoryVideoStore::new());
        let id = VideoId::new();
        store
            .create(&CreateVideo {
                id,
                user_id: UserId::new(),
                username: "alice".into(),
                title: "clip.mp4".into(),
                duration: 12.0,
                server_location: "10.0.0.1".into(),
                privacy: Privacy::Public,
            })
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_concurrent_unions_lose_nothing() {
        let (store, id) = seeded().await;
        let mut handles = Vec::new();
        for (res, loc) in [("480", "10.0.0.1"), ("360", "10.0.0.2"), ("240", "10.0.0.1"), ("480", "10.0.0.2")] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_rendition(id, res, loc).await.unwrap()
            }));
        }
        for h in handles {
            assert!(h.await.unwrap());
        }

        let video = store.find_by_id(id).await.unwrap().unwrap();
        let mut res = video.resolutions.clone();
        res.sort();
        assert_eq!(res, vec!["240", "360", "480"]);
        assert_eq!(video.server_locations.len(), 2);
    }

    #[tokio::test]
    async fn test_add_rendition_unknown_video() {
        let store = MemoryVideoStore::new();
        assert!(!store.add_rendition(VideoId::new(), "720", "n").await.unwrap());
    }
}
