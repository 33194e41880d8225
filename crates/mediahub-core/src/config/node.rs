//! Node role configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which half of the platform this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Registry, metrics collector, balancer and user-facing setup APIs.
    Coordinator,
    /// Chunk ingest, task consumer and streaming-server webhooks.
    Worker,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinator => write!(f, "coordinator"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

/// Identity of this node within the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Role of this process.
    #[serde(default = "default_role")]
    pub role: NodeRole,
    /// Network address (`host` or `host:port`) other nodes and clients use
    /// to reach this node. Recorded as the video/livestream location.
    #[serde(default = "default_public_address")]
    pub public_address: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            public_address: default_public_address(),
        }
    }
}

fn default_role() -> NodeRole {
    NodeRole::Worker
}

fn default_public_address() -> String {
    "localhost".to_string()
}
