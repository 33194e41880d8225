//! In-memory livestream keys and records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::{LivestreamId, LivestreamKeyId, UserId};
use mediahub_entity::livestream::{CreateLivestream, Livestream, LivestreamKey};
use mediahub_entity::video::Privacy;

use crate::store::{LivestreamKeyStore, LivestreamStore};

/// Livestream keys held in a concurrent map keyed by owner.
#[derive(Debug, Default)]
pub struct MemoryLivestreamKeyStore {
    keys: DashMap<UserId, LivestreamKey>,
}

impl MemoryLivestreamKeyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn find_where(&self, pred: impl Fn(&LivestreamKey) -> bool) -> Option<LivestreamKey> {
        self.keys.iter().find(|k| pred(k)).map(|k| k.clone())
    }

    fn modify(
        &self,
        id: LivestreamKeyId,
        f: impl FnOnce(&mut LivestreamKey),
    ) -> Option<LivestreamKey> {
        let mut entry = self.keys.iter_mut().find(|k| k.id == id)?;
        f(&mut *entry);
        entry.updated_at = Utc::now();
        Some(entry.clone())
    }
}

#[async_trait]
impl LivestreamKeyStore for MemoryLivestreamKeyStore {
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Option<LivestreamKey>> {
        Ok(self.keys.get(&user_id).map(|k| k.clone()))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<LivestreamKey>> {
        Ok(self.find_where(|k| k.username == username))
    }

    async fn find_by_stream_key(&self, stream_key: &str) -> AppResult<Option<LivestreamKey>> {
        Ok(self.find_where(|k| k.stream_key == stream_key))
    }

    async fn insert_if_absent(&self, key: &LivestreamKey) -> AppResult<LivestreamKey> {
        Ok(self
            .keys
            .entry(key.user_id)
            .or_insert_with(|| key.clone())
            .clone())
    }

    async fn update_info(
        &self,
        id: LivestreamKeyId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<LivestreamKey>> {
        Ok(self.modify(id, |k| {
            k.title = title.map(str::to_string);
            k.description = description.map(str::to_string);
        }))
    }

    async fn rotate(&self, id: LivestreamKeyId, new_key: &str) -> AppResult<Option<LivestreamKey>> {
        if self.find_where(|k| k.stream_key == new_key).is_some() {
            return Err(AppError::conflict("Stream key collision"));
        }
        Ok(self.modify(id, |k| k.stream_key = new_key.to_string()))
    }

    async fn mark_live(
        &self,
        id: LivestreamKeyId,
        livestream_id: LivestreamId,
        started_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.modify(id, |k| {
            k.is_live = true;
            k.current_livestream_id = Some(livestream_id);
            k.publish_started_at = Some(started_at);
        });
        Ok(())
    }

    async fn mark_offline(&self, id: LivestreamKeyId) -> AppResult<()> {
        self.modify(id, |k| {
            k.is_live = false;
            k.current_livestream_id = None;
            k.publish_started_at = None;
        });
        Ok(())
    }
}

/// Livestream records held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryLivestreamStore {
    streams: DashMap<LivestreamId, Livestream>,
}

impl MemoryLivestreamStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    /// Whether no record is stored.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

#[async_trait]
impl LivestreamStore for MemoryLivestreamStore {
    async fn create(&self, data: &CreateLivestream) -> AppResult<Livestream> {
        let stream = Livestream {
            id: LivestreamId::new(),
            user_id: data.user_id,
            username: data.username.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            thumbnail: None,
            duration: 0.0,
            server_location: data.server_location.clone(),
            privacy: Privacy::Public,
            dvr_path: None,
            uploaded_at: data.started_at,
            ended_at: None,
            updated_at: Utc::now(),
        };
        self.streams.insert(stream.id, stream.clone());
        Ok(stream)
    }

    async fn find_by_id(&self, id: LivestreamId) -> AppResult<Option<Livestream>> {
        Ok(self.streams.get(&id).map(|s| s.clone()))
    }

    async fn finish(&self, id: LivestreamId, ended_at: DateTime<Utc>, duration: f64) -> AppResult<()> {
        if let Some(mut s) = self.streams.get_mut(&id) {
            s.ended_at = Some(ended_at);
            if s.dvr_path.is_none() {
                s.duration = duration;
            }
            s.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_recording(&self, id: LivestreamId, dvr_path: &str, duration: f64) -> AppResult<()> {
        if let Some(mut s) = self.streams.get_mut(&id) {
            s.dvr_path = Some(dvr_path.to_string());
            s.duration = duration;
            s.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_recordings(&self, username: &str, limit: u32) -> AppResult<Vec<Livestream>> {
        let mut found: Vec<Livestream> = self
            .streams
            .iter()
            .filter(|s| s.username == username && s.dvr_path.is_some())
            .map(|s| s.clone())
            .collect();
        found.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        found.truncate(limit.max(1) as usize);
        Ok(found)
    }

    async fn update_metadata(
        &self,
        id: LivestreamId,
        title: &str,
        description: &str,
    ) -> AppResult<Option<Livestream>> {
        Ok(self.streams.get_mut(&id).map(|mut s| {
            s.title = title.to_string();
            s.description = description.to_string();
            s.updated_at = Utc::now();
            s.clone()
        }))
    }

    async fn delete(&self, id: LivestreamId) -> AppResult<bool> {
        Ok(self.streams.remove(&id).is_some())
    }
}
