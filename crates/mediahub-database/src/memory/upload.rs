//! In-memory upload sessions.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use mediahub_core::result::AppResult;
use mediahub_core::types::UploadSessionId;
use mediahub_entity::upload::{CompleteUpload, CreateUploadSession, UploadSession, UploadStatus};

use crate::store::UploadSessionStore;

/// Upload sessions held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryUploadSessionStore {
    sessions: DashMap<UploadSessionId, UploadSession>,
}

impl MemoryUploadSessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UploadSessionStore for MemoryUploadSessionStore {
    async fn create(&self, data: &CreateUploadSession) -> AppResult<UploadSession> {
        let now = Utc::now();
        let session = UploadSession {
            id: UploadSessionId::new(),
            user_id: data.user_id,
            username: data.username.clone(),
            server_address: data.server_address.clone(),
            total_chunks: None,
            file_name: data.file_name.clone(),
            file_type: data.file_type.clone(),
            file_size: data.file_size,
            duration: None,
            video_id: None,
            status: UploadStatus::Uploading,
            created_at: now,
            updated_at: now,
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: UploadSessionId) -> AppResult<Option<UploadSession>> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn try_begin_assembly(&self, id: UploadSessionId) -> AppResult<bool> {
        Ok(match self.sessions.get_mut(&id) {
            Some(mut s) if s.status == UploadStatus::Uploading => {
                s.status = UploadStatus::Assembling;
                s.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn abort_assembly(&self, id: UploadSessionId) -> AppResult<()> {
        if let Some(mut s) = self.sessions.get_mut(&id) {
            if s.status == UploadStatus::Assembling {
                s.status = UploadStatus::Uploading;
                s.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn complete(&self, id: UploadSessionId, data: &CompleteUpload) -> AppResult<()> {
        if let Some(mut s) = self.sessions.get_mut(&id) {
            s.status = UploadStatus::Completed;
            s.total_chunks = Some(data.total_chunks);
            s.file_name = Some(data.file_name.clone());
            s.file_type = data.file_type.clone();
            s.file_size = Some(data.file_size);
            s.duration = data.duration;
            s.video_id = Some(data.video_id);
            s.updated_at = Utc::now();
        }
        Ok(())
    }
}
