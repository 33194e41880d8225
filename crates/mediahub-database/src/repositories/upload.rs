//! Upload session repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_core::types::UploadSessionId;
use mediahub_entity::upload::{CompleteUpload, CreateUploadSession, UploadSession};

use crate::store::UploadSessionStore;

/// Postgres-backed upload sessions.
#[derive(Debug, Clone)]
pub struct UploadSessionRepository {
    pool: PgPool,
}

impl UploadSessionRepository {
    /// Create a new upload session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UploadSessionStore for UploadSessionRepository {
    async fn create(&self, data: &CreateUploadSession) -> AppResult<UploadSession> {
        sqlx::query_as::<_, UploadSession>(
            "INSERT INTO upload_sessions (id, user_id, username, server_address, file_name, file_type, file_size) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(UploadSessionId::new())
        .bind(data.user_id)
        .bind(&data.username)
        .bind(&data.server_address)
        .bind(&data.file_name)
        .bind(&data.file_type)
        .bind(data.file_size)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create upload session", e))
    }

    async fn find_by_id(&self, id: UploadSessionId) -> AppResult<Option<UploadSession>> {
        sqlx::query_as::<_, UploadSession>("SELECT * FROM upload_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find upload session", e))
    }

    async fn try_begin_assembly(&self, id: UploadSessionId) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE upload_sessions SET status = 'ASSEMBLING', updated_at = NOW() \
             WHERE id = $1 AND status = 'UPLOADING'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim upload merge", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn abort_assembly(&self, id: UploadSessionId) -> AppResult<()> {
        sqlx::query(
            "UPDATE upload_sessions SET status = 'UPLOADING', updated_at = NOW() \
             WHERE id = $1 AND status = 'ASSEMBLING'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to release upload merge", e))?;
        Ok(())
    }

    async fn complete(&self, id: UploadSessionId, data: &CompleteUpload) -> AppResult<()> {
        sqlx::query(
            "UPDATE upload_sessions SET status = 'COMPLETED', total_chunks = $2, file_name = $3, \
             file_type = $4, file_size = $5, duration = $6, video_id = $7, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(data.total_chunks)
        .bind(&data.file_name)
        .bind(&data.file_type)
        .bind(data.file_size)
        .bind(data.duration)
        .bind(data.video_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to complete upload session", e))?;
        Ok(())
    }
}
