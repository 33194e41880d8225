//! Worker repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_core::types::WorkerId;
use mediahub_entity::worker::{CreateWorker, ResourceSnapshot, WorkerNode, WorkerStatus};

use crate::connection::map_db_error;
use crate::store::WorkerStore;

const ADDRESS_TAKEN: &str = "Server address already exists";

/// Postgres-backed worker registry.
#[derive(Debug, Clone)]
pub struct WorkerRepository {
    pool: PgPool,
}

impl WorkerRepository {
    /// Create a new worker repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

#[async_trait]
impl WorkerStore for WorkerRepository {
    async fn list(&self) -> AppResult<Vec<WorkerNode>> {
        sqlx::query_as::<_, WorkerNode>("SELECT * FROM workers ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("Failed to list workers"))
    }

    async fn find_by_id(&self, id: WorkerId) -> AppResult<Option<WorkerNode>> {
        sqlx::query_as::<_, WorkerNode>("SELECT * FROM workers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find worker"))
    }

    async fn find_by_address(&self, address: &str) -> AppResult<Option<WorkerNode>> {
        sqlx::query_as::<_, WorkerNode>("SELECT * FROM workers WHERE address = $1")
            .bind(address)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find worker by address"))
    }

    async fn create(&self, data: &CreateWorker) -> AppResult<WorkerNode> {
        sqlx::query_as::<_, WorkerNode>(
            "INSERT INTO workers (id, name, address, status) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(WorkerId::new())
        .bind(&data.name)
        .bind(&data.address)
        .bind(WorkerStatus::Down)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to register worker", ADDRESS_TAKEN))
    }

    async fn update_identity(
        &self,
        id: WorkerId,
        name: &str,
        address: &str,
    ) -> AppResult<Option<WorkerNode>> {
        sqlx::query_as::<_, WorkerNode>(
            "UPDATE workers SET name = $2, address = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error(e, "Failed to update worker", ADDRESS_TAKEN))
    }

    async fn delete(&self, id: WorkerId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM workers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to delete worker"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_up(&self, id: WorkerId, snapshot: &ResourceSnapshot) -> AppResult<()> {
        sqlx::query(
            "UPDATE workers SET status = 'UP', ram_total = $2, ram_used_pct = $3, \
             cpu_cores = $4, cpu_used_pct = $5, disk_total = $6, disk_used_pct = $7, \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(snapshot.ram_total)
        .bind(snapshot.ram_used_pct)
        .bind(snapshot.cpu_cores)
        .bind(snapshot.cpu_used_pct)
        .bind(snapshot.disk_total)
        .bind(snapshot.disk_used_pct)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark worker up"))?;
        Ok(())
    }

    async fn mark_down(&self, id: WorkerId) -> AppResult<()> {
        sqlx::query(
            "UPDATE workers SET status = 'DOWN', current_load = 0, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to mark worker down"))?;
        Ok(())
    }

    async fn adjust_load(&self, address: &str, delta: i32) -> AppResult<()> {
        sqlx::query(
            "UPDATE workers SET current_load = GREATEST(current_load + $2, 0), updated_at = NOW() \
             WHERE address = $1",
        )
        .bind(address)
        .bind(delta)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to adjust worker load"))?;
        Ok(())
    }
}
