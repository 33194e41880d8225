//! Resource-aware worker selection.
//!
//! Every UP worker is scored from its last resource snapshot and the
//! lowest score wins. Snapshots may be one collector cycle stale.

use std::sync::Arc;

use tracing::{debug, warn};

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_database::store::WorkerStore;
use mediahub_entity::worker::{ResourceSnapshot, WorkerNode};

/// Weight of CPU utilization in the score.
pub const CPU_WEIGHT: f64 = 0.40;
/// Weight of RAM utilization in the score.
pub const RAM_WEIGHT: f64 = 0.40;
/// Weight of disk utilization in the score.
pub const DISK_WEIGHT: f64 = 0.20;

/// Weighted utilization of a snapshot. Missing values count as 0.
pub fn utilization_score(snapshot: &ResourceSnapshot) -> f64 {
    CPU_WEIGHT * snapshot.cpu_used_pct.unwrap_or(0.0)
        + RAM_WEIGHT * snapshot.ram_used_pct.unwrap_or(0.0)
        + DISK_WEIGHT * snapshot.disk_used_pct.unwrap_or(0.0)
}

/// Pick the UP worker with the strictly lowest score; the first one wins ties.
pub fn select_worker(workers: &[WorkerNode]) -> AppResult<&WorkerNode> {
    let mut best: Option<(&WorkerNode, f64)> = None;
    for worker in workers.iter().filter(|w| w.is_up()) {
        let score = utilization_score(&worker.specification);
        debug!(worker = %worker.address, score, "Scored worker");
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((worker, score)),
        }
    }
    best.map(|(w, _)| w)
        .ok_or_else(|| AppError::no_capacity("No available servers"))
}

/// Selects workers for new uploads and livestreams and keeps their
/// running-job counters.
#[derive(Clone)]
pub struct LoadBalancer {
    workers: Arc<dyn WorkerStore>,
}

impl std::fmt::Debug for LoadBalancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancer").finish()
    }
}

impl LoadBalancer {
    /// Creates a balancer over the registry.
    pub fn new(workers: Arc<dyn WorkerStore>) -> Self {
        Self { workers }
    }

    /// Select the best worker without recording any work on it.
    pub async fn select(&self) -> AppResult<WorkerNode> {
        let workers = self.workers.list().await?;
        let chosen = select_worker(&workers)?.clone();
        debug!(worker = %chosen.address, "Selected worker");
        Ok(chosen)
    }

    /// Select the best worker and count one more running job on it.
    pub async fn assign(&self) -> AppResult<WorkerNode> {
        let worker = self.select().await?;
        self.workers.adjust_load(&worker.address, 1).await?;
        Ok(worker)
    }

    /// Count one job on `address` as finished. Failures are logged.
    pub async fn release(&self, address: &str) {
        if let Err(e) = self.workers.adjust_load(address, -1).await {
            warn!(worker = %address, error = %e, "Failed to release worker load");
        }
    }

    /// Count one job on `address` as started. Failures are logged.
    pub async fn acquire(&self, address: &str) {
        if let Err(e) = self.workers.adjust_load(address, 1).await {
            warn!(worker = %address, error = %e, "Failed to record worker load");
        }
    }
}
