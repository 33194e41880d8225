//! Local media storage configuration.

use serde::{Deserialize, Serialize};

/// Per-node filesystem layout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding `uploads/` and `outputs/`.
    #[serde(default = "default_root")]
    pub root: String,
    /// Directory prefix the streaming server reports DVR files under,
    /// as seen from inside its own container.
    #[serde(default = "default_sandbox_prefix")]
    pub sandbox_prefix: String,
    /// Sub-directory of `root` where that sandbox directory is mounted.
    #[serde(default = "default_sandbox_mount")]
    pub sandbox_mount: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            sandbox_prefix: default_sandbox_prefix(),
            sandbox_mount: default_sandbox_mount(),
        }
    }
}

fn default_root() -> String {
    "storage".to_string()
}

fn default_sandbox_prefix() -> String {
    "/usr/local/srs/objs/nginx/html/live/".to_string()
}

fn default_sandbox_mount() -> String {
    "srs".to_string()
}
