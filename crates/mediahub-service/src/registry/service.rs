//! Worker registration and lookup.

use std::sync::Arc;

use tracing::info;

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::WorkerId;
use mediahub_database::store::WorkerStore;
use mediahub_entity::worker::{CreateWorker, WorkerNode};

/// CRUD over the worker registry.
#[derive(Clone)]
pub struct RegistryService {
    workers: Arc<dyn WorkerStore>,
}

impl std::fmt::Debug for RegistryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryService").finish()
    }
}

impl RegistryService {
    /// Creates a registry service.
    pub fn new(workers: Arc<dyn WorkerStore>) -> Self {
        Self { workers }
    }

    /// Register a worker. It stays DOWN until the collector sees it.
    pub async fn register(&self, name: &str, address: &str) -> AppResult<WorkerNode> {
        let data = CreateWorker {
            name: required(name, "name")?,
            address: required(address, "address")?,
        };
        let worker = self.workers.create(&data).await?;
        info!(worker_id = %worker.id, address = %worker.address, "Worker registered");
        Ok(worker)
    }

    /// All workers in registration order.
    pub async fn list(&self) -> AppResult<Vec<WorkerNode>> {
        self.workers.list().await
    }

    /// One worker by id.
    pub async fn get(&self, id: WorkerId) -> AppResult<WorkerNode> {
        self.workers
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Server not found"))
    }

    /// Change a worker's name and address.
    pub async fn update(&self, id: WorkerId, name: &str, address: &str) -> AppResult<WorkerNode> {
        let name = required(name, "name")?;
        let address = required(address, "address")?;
        let worker = self
            .workers
            .update_identity(id, &name, &address)
            .await?
            .ok_or_else(|| AppError::not_found("Server not found"))?;
        info!(worker_id = %id, address = %worker.address, "Worker updated");
        Ok(worker)
    }

    /// Deregister a worker.
    pub async fn delete(&self, id: WorkerId) -> AppResult<()> {
        if !self.workers.delete(id).await? {
            return Err(AppError::not_found("Server not found"));
        }
        info!(worker_id = %id, "Worker deregistered");
        Ok(())
    }
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("Server {field} is required")));
    }
    Ok(trimmed.to_string())
}
