//! Livestream key and livestream repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_core::types::{LivestreamId, LivestreamKeyId, UserId};
use mediahub_entity::livestream::{CreateLivestream, Livestream, LivestreamKey};
use mediahub_entity::video::Privacy;

use crate::connection::map_db_error;
use crate::store::{LivestreamKeyStore, LivestreamStore};

/// Postgres-backed livestream keys.
#[derive(Debug, Clone)]
pub struct LivestreamKeyRepository {
    pool: PgPool,
}

impl LivestreamKeyRepository {
    /// Create a new livestream key repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> AppResult<Option<LivestreamKey>> {
        let sql = format!("SELECT * FROM livestream_keys WHERE {column} = $1");
        sqlx::query_as::<_, LivestreamKey>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find livestream key", e))
    }
}

#[async_trait]
impl LivestreamKeyStore for LivestreamKeyRepository {
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Option<LivestreamKey>> {
        sqlx::query_as::<_, LivestreamKey>("SELECT * FROM livestream_keys WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find livestream key", e))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<LivestreamKey>> {
        self.find_one("username", username).await
    }

    async fn find_by_stream_key(&self, stream_key: &str) -> AppResult<Option<LivestreamKey>> {
        self.find_one("stream_key", stream_key).await
    }

    async fn insert_if_absent(&self, key: &LivestreamKey) -> AppResult<LivestreamKey> {
        let inserted = sqlx::query_as::<_, LivestreamKey>(
            "INSERT INTO livestream_keys (id, user_id, username, stream_key, is_live, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, FALSE, $5, $5) \
             ON CONFLICT (user_id) DO NOTHING RETURNING *",
        )
        .bind(key.id)
        .bind(key.user_id)
        .bind(&key.username)
        .bind(&key.stream_key)
        .bind(key.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to create livestream key", "Stream key collision"))?;

        match inserted {
            Some(key) => Ok(key),
            None => self
                .find_by_user_id(key.user_id)
                .await?
                .ok_or_else(|| AppError::internal("Livestream key vanished after conflict")),
        }
    }

    async fn update_info(
        &self,
        id: LivestreamKeyId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<LivestreamKey>> {
        sqlx::query_as::<_, LivestreamKey>(
            "UPDATE livestream_keys SET title = $2, description = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update livestream key", e))
    }

    async fn rotate(&self, id: LivestreamKeyId, new_key: &str) -> AppResult<Option<LivestreamKey>> {
        sqlx::query_as::<_, LivestreamKey>(
            "UPDATE livestream_keys SET stream_key = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to rotate stream key", "Stream key collision"))
    }

    async fn mark_live(
        &self,
        id: LivestreamKeyId,
        livestream_id: LivestreamId,
        started_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE livestream_keys SET is_live = TRUE, current_livestream_id = $2, \
             publish_started_at = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(livestream_id)
        .bind(started_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark key live", e))?;
        Ok(())
    }

    async fn mark_offline(&self, id: LivestreamKeyId) -> AppResult<()> {
        sqlx::query(
            "UPDATE livestream_keys SET is_live = FALSE, current_livestream_id = NULL, \
             publish_started_at = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark key offline", e))?;
        Ok(())
    }
}

/// Postgres-backed livestream records.
#[derive(Debug, Clone)]
pub struct LivestreamRepository {
    pool: PgPool,
}

impl LivestreamRepository {
    /// Create a new livestream repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LivestreamStore for LivestreamRepository {
    async fn create(&self, data: &CreateLivestream) -> AppResult<Livestream> {
        sqlx::query_as::<_, Livestream>(
            "INSERT INTO livestreams (id, user_id, username, title, description, server_location, privacy, uploaded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(LivestreamId::new())
        .bind(data.user_id)
        .bind(&data.username)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.server_location)
        .bind(Privacy::Public)
        .bind(data.started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create livestream", e))
    }

    async fn find_by_id(&self, id: LivestreamId) -> AppResult<Option<Livestream>> {
        sqlx::query_as::<_, Livestream>("SELECT * FROM livestreams WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find livestream", e))
    }

    async fn finish(&self, id: LivestreamId, ended_at: DateTime<Utc>, duration: f64) -> AppResult<()> {
        sqlx::query(
            "UPDATE livestreams SET ended_at = $2, \
             duration = CASE WHEN dvr_path IS NULL THEN $3 ELSE duration END, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(ended_at)
        .bind(duration)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to finish livestream", e))?;
        Ok(())
    }

    async fn set_recording(&self, id: LivestreamId, dvr_path: &str, duration: f64) -> AppResult<()> {
        sqlx::query(
            "UPDATE livestreams SET dvr_path = $2, duration = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(dvr_path)
        .bind(duration)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to attach recording", e))?;
        Ok(())
    }

    async fn list_recordings(&self, username: &str, limit: u32) -> AppResult<Vec<Livestream>> {
        sqlx::query_as::<_, Livestream>(
            "SELECT * FROM livestreams WHERE username = $1 AND dvr_path IS NOT NULL \
             ORDER BY uploaded_at DESC LIMIT $2",
        )
        .bind(username)
        .bind(i64::from(limit.max(1)))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list recordings", e))
    }

    async fn update_metadata(
        &self,
        id: LivestreamId,
        title: &str,
        description: &str,
    ) -> AppResult<Option<Livestream>> {
        sqlx::query_as::<_, Livestream>(
            "UPDATE livestreams SET title = $2, description = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update livestream", e))
    }

    async fn delete(&self, id: LivestreamId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM livestreams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete livestream", e))?;
        Ok(result.rows_affected() > 0)
    }
}
