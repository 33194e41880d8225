//! Worker health status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Health of a worker node as last observed by the metrics collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "worker_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum WorkerStatus {
    /// Liveness probe succeeded during the last cycle.
    Up,
    /// Never probed, or the last probe failed.
    #[default]
    Down,
}

impl WorkerStatus {
    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
