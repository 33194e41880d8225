//! Worker metrics polling configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the coordinator's metrics collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Whether the collector runs on this node.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Prometheus-compatible query endpoint, e.g. `http://prometheus:9090/api/v1/query`.
    #[serde(default = "default_query_url")]
    pub query_url: String,
    /// Delay between the end of one polling cycle and the next.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Delay before the first cycle after startup.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,
    /// Timeout for a single metrics query.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Port the node exporter listens on; appended to a worker address
    /// when building the `instance` label.
    #[serde(default)]
    pub exporter_port: Option<u16>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            query_url: default_query_url(),
            interval_seconds: default_interval(),
            initial_delay_seconds: default_initial_delay(),
            request_timeout_seconds: default_request_timeout(),
            exporter_port: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_query_url() -> String {
    "http://localhost:9090/api/v1/query".to_string()
}

fn default_interval() -> u64 {
    10
}

fn default_initial_delay() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    3
}
