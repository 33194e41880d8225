//! Worker node model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use mediahub_core::types::WorkerId;

use super::status::WorkerStatus;

/// Resource utilization of a worker, overwritten on every successful poll.
///
/// Every metric is optional: a node that was never polled, or whose
/// exporter omitted a series, simply has no value for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ResourceSnapshot {
    /// Total memory in GiB.
    pub ram_total: Option<f64>,
    /// Memory in use, percent.
    pub ram_used_pct: Option<f64>,
    /// Logical CPU count.
    pub cpu_cores: Option<f64>,
    /// CPU busy time, percent.
    pub cpu_used_pct: Option<f64>,
    /// Total disk capacity in GiB.
    pub disk_total: Option<f64>,
    /// Disk space in use, percent.
    pub disk_used_pct: Option<f64>,
}

/// A registered worker node.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkerNode {
    /// Unique worker identifier.
    pub id: WorkerId,
    /// Human-readable name.
    pub name: String,
    /// Network address (`host` or `host:port`), unique across the registry.
    pub address: String,
    /// Last observed health.
    pub status: WorkerStatus,
    /// Last observed resource utilization.
    #[sqlx(flatten)]
    pub specification: ResourceSnapshot,
    /// Jobs believed to be running on the node. Cleared when it goes DOWN.
    pub current_load: i32,
    /// When the worker was registered.
    pub created_at: DateTime<Utc>,
    /// When the worker record last changed.
    pub updated_at: DateTime<Utc>,
}

impl WorkerNode {
    /// Whether the balancer may assign work to this node.
    pub fn is_up(&self) -> bool {
        self.status == WorkerStatus::Up
    }

    /// Base HTTP URL of the node.
    pub fn base_url(&self) -> String {
        http_base_url(&self.address)
    }
}

/// Data required to register a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorker {
    /// Human-readable name.
    pub name: String,
    /// Network address.
    pub address: String,
}

/// Normalize a bare node address into an `http://` base URL without a
/// trailing slash. Addresses that already carry a scheme are kept.
pub fn http_base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}
