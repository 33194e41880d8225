//! In-memory worker registry.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::WorkerId;
use mediahub_entity::worker::{CreateWorker, ResourceSnapshot, WorkerNode, WorkerStatus};

use crate::store::WorkerStore;

/// Worker registry held in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryWorkerStore {
    workers: DashMap<WorkerId, WorkerNode>,
}

impl MemoryWorkerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed worker, replacing any with the same id.
    pub fn insert(&self, worker: WorkerNode) {
        self.workers.insert(worker.id, worker);
    }

    fn address_taken(&self, address: &str, except: Option<WorkerId>) -> bool {
        self.workers
            .iter()
            .any(|w| w.address == address && Some(w.id) != except)
    }
}

#[async_trait]
impl WorkerStore for MemoryWorkerStore {
    async fn list(&self) -> AppResult<Vec<WorkerNode>> {
        let mut all: Vec<WorkerNode> = self.workers.iter().map(|w| w.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn find_by_id(&self, id: WorkerId) -> AppResult<Option<WorkerNode>> {
        Ok(self.workers.get(&id).map(|w| w.clone()))
    }

    async fn find_by_address(&self, address: &str) -> AppResult<Option<WorkerNode>> {
        Ok(self
            .workers
            .iter()
            .find(|w| w.address == address)
            .map(|w| w.clone()))
    }

    async fn create(&self, data: &CreateWorker) -> AppResult<WorkerNode> {
        if self.address_taken(&data.address, None) {
            return Err(AppError::conflict("Server address already exists"));
        }
        let now = Utc::now();
        let worker = WorkerNode {
            id: WorkerId::new(),
            name: data.name.clone(),
            address: data.address.clone(),
            status: WorkerStatus::Down,
            specification: ResourceSnapshot::default(),
            current_load: 0,
            created_at: now,
            updated_at: now,
        };
        self.workers.insert(worker.id, worker.clone());
        Ok(worker)
    }

    async fn update_identity(
        &self,
        id: WorkerId,
        name: &str,
        address: &str,
    ) -> AppResult<Option<WorkerNode>> {
        if self.address_taken(address, Some(id)) {
            return Err(AppError::conflict("Server address already exists"));
        }
        Ok(self.workers.get_mut(&id).map(|mut w| {
            w.name = name.to_string();
            w.address = address.to_string();
            w.updated_at = Utc::now();
            w.clone()
        }))
    }

    async fn delete(&self, id: WorkerId) -> AppResult<bool> {
        Ok(self.workers.remove(&id).is_some())
    }

    async fn mark_up(&self, id: WorkerId, snapshot: &ResourceSnapshot) -> AppResult<()> {
        if let Some(mut w) = self.workers.get_mut(&id) {
            w.status = WorkerStatus::Up;
            w.specification = snapshot.clone();
            w.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_down(&self, id: WorkerId) -> AppResult<()> {
        if let Some(mut w) = self.workers.get_mut(&id) {
            w.status = WorkerStatus::Down;
            w.current_load = 0;
            w.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn adjust_load(&self, address: &str, delta: i32) -> AppResult<()> {
        if let Some(mut w) = self.workers.iter_mut().find(|w| w.address == address) {
            w.current_load = (w.current_load + delta).max(0);
            w.updated_at = Utc::now();
        }
        Ok(())
    }
}
