//! Upload session creation and lookup (coordinator side).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::UploadSessionId;
use mediahub_database::store::UploadSessionStore;
use mediahub_entity::upload::{CreateUploadSession, UploadSession};

use crate::context::Caller;
use crate::registry::LoadBalancer;

/// Declared metadata of a new upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewUploadSession {
    /// Original file name.
    pub file_name: Option<String>,
    /// MIME type.
    pub file_type: Option<String>,
    /// Total size in bytes.
    pub file_size: Option<i64>,
}

/// Opens upload sessions bound to the least-loaded worker.
#[derive(Clone)]
pub struct UploadSessionService {
    sessions: Arc<dyn UploadSessionStore>,
    balancer: LoadBalancer,
}

impl std::fmt::Debug for UploadSessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSessionService").finish()
    }
}

impl UploadSessionService {
    /// Creates an upload session service.
    pub fn new(sessions: Arc<dyn UploadSessionStore>, balancer: LoadBalancer) -> Self {
        Self { sessions, balancer }
    }

    /// Select a worker, count the upload on it and open a session there.
    ///
    /// Fails with `NoCapacity` when no worker is UP; nothing is recorded then.
    pub async fn create(&self, caller: &Caller, meta: NewUploadSession) -> AppResult<UploadSession> {
        if meta.file_size.is_some_and(|s| s < 0) {
            return Err(AppError::validation("File size must not be negative"));
        }

        let worker = self.balancer.assign().await?;
        let created = self
            .sessions
            .create(&CreateUploadSession {
                user_id: caller.user_id,
                username: caller.username.clone(),
                server_address: worker.address.clone(),
                file_name: meta.file_name,
                file_type: meta.file_type,
                file_size: meta.file_size,
            })
            .await;

        let session = match created {
            Ok(s) => s,
            Err(e) => {
                self.balancer.release(&worker.address).await;
                return Err(e);
            }
        };

        info!(
            session_id = %session.id,
            user = %caller.username,
            worker = %worker.address,
            "Upload session created"
        );
        Ok(session)
    }

    /// A session, visible to its owner only.
    pub async fn get(&self, caller: &Caller, id: UploadSessionId) -> AppResult<UploadSession> {
        self.sessions
            .find_by_id(id)
            .await?
            .filter(|s| s.is_owned_by(caller.user_id))
            .ok_or_else(|| AppError::not_found("Upload session not found"))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mediahub_core::error::ErrorKind;
    use mediahub_core::types::{UserId, WorkerId};
    use mediahub_database::memory::{MemoryUploadSessionStore, MemoryWorkerStore};
    use mediahub_database::store::WorkerStore;
    use mediahub_entity::upload::UploadStatus;
    use mediahub_entity::worker::{ResourceSnapshot, WorkerNode, WorkerStatus};

    use super::*;

    fn up_worker(address: &str, cpu: f64) -> WorkerNode {
        let now = Utc::now();
        WorkerNode {
            id: WorkerId::new(),
            name: address.to_string(),
            address: address.to_string(),
            status: WorkerStatus::Up,
            specification: ResourceSnapshot {
                cpu_used_pct: Some(cpu),
                ..Default::default()
            },
            current_load: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_session_bound_to_best_worker() {
        let workers = Arc::new(MemoryWorkerStore::new());
        workers.insert(up_worker("busy:8081", 90.0));
        workers.insert(up_worker("idle:8081", 5.0));
        let svc = UploadSessionService::new(
            Arc::new(MemoryUploadSessionStore::new()),
            LoadBalancer::new(workers.clone()),
        );
        let caller = Caller::new(UserId::new(), "alice");

        let session = svc.create(&caller, NewUploadSession::default()).await.unwrap();
        assert_eq!(session.server_address, "idle:8081");
        assert_eq!(session.status, UploadStatus::Uploading);
        assert_eq!(
            session.destination_url(),
            format!("http://idle:8081/api/uploads/{}", session.id)
        );

        let idle = workers.find_by_address("idle:8081").await.unwrap().unwrap();
        assert_eq!(idle.current_load, 1);
    }

    #[tokio::test]
    async fn test_no_capacity_creates_nothing() {
        let sessions = Arc::new(MemoryUploadSessionStore::new());
        let svc = UploadSessionService::new(
            sessions.clone(),
            LoadBalancer::new(Arc::new(MemoryWorkerStore::new())),
        );
        let caller = Caller::new(UserId::new(), "alice");
        let err = svc.create(&caller, NewUploadSession::default()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoCapacity);
    }

    #[tokio::test]
    async fn test_session_hidden_from_other_users() {
        let workers = Arc::new(MemoryWorkerStore::new());
        workers.insert(up_worker("a:1", 1.0));
        let svc = UploadSessionService::new(
            Arc::new(MemoryUploadSessionStore::new()),
            LoadBalancer::new(workers),
        );
        let owner = Caller::new(UserId::new(), "alice");
        let other = Caller::new(UserId::new(), "mallory");

        let session = svc.create(&owner, NewUploadSession::default()).await.unwrap();
        assert!(svc.get(&owner, session.id).await.is_ok());
        let err = svc.get(&other, session.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
