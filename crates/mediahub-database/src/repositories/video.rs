//! Video repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_core::types::VideoId;
use mediahub_entity::video::{CreateVideo, Video};

use crate::store::VideoStore;

/// Postgres-backed videos.
#[derive(Debug, Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    /// Create a new video repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn create(&self, data: &CreateVideo) -> AppResult<Video> {
        sqlx::query_as::<_, Video>(
            "INSERT INTO videos (id, user_id, username, title, duration, server_locations, privacy) \
             VALUES ($1, $2, $3, $4, $5, ARRAY[$6::TEXT], $7) RETURNING *",
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(&data.username)
        .bind(&data.title)
        .bind(data.duration)
        .bind(&data.server_location)
        .bind(data.privacy)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create video", e))
    }

    async fn find_by_id(&self, id: VideoId) -> AppResult<Option<Video>> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find video", e))
    }

    async fn set_thumbnail(&self, id: VideoId, url: &str) -> AppResult<()> {
        sqlx::query("UPDATE videos SET thumbnail = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to set thumbnail", e))?;
        Ok(())
    }

    async fn add_rendition(
        &self,
        id: VideoId,
        resolution: &str,
        location: &str,
    ) -> AppResult<bool> {
        // Single statement: the row lock serializes concurrent unions.
        let result = sqlx::query(
            "UPDATE videos SET \
                resolutions = CASE WHEN $2 = ANY(resolutions) THEN resolutions \
                                   ELSE array_append(resolutions, $2) END, \
                server_locations = CASE WHEN $3 = ANY(server_locations) THEN server_locations \
                                        ELSE array_append(server_locations, $3) END, \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(resolution)
        .bind(location)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record rendition", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: VideoId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete video", e))?;
        Ok(result.rows_affected() > 0)
    }
}
