//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod database;
pub mod livestream;
pub mod logging;
pub mod media;
pub mod monitor;
pub mod node;
pub mod queue;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::database::DatabaseConfig;
pub use self::livestream::LivestreamConfig;
pub use self::logging::LoggingConfig;
pub use self::media::MediaConfig;
pub use self::monitor::MonitorConfig;
pub use self::node::{NodeConfig, NodeRole};
pub use self::queue::{QueueConfig, RedisConfig};
pub use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Role and advertised address of this node.
    #[serde(default)]
    pub node: NodeConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Redis connection settings (task queue transport).
    #[serde(default)]
    pub redis: RedisConfig,
    /// Local media storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Worker metrics polling settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Task queue consumer settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// External media tool settings.
    #[serde(default)]
    pub media: MediaConfig,
    /// Livestream ingest and webhook settings.
    #[serde(default)]
    pub livestream: LivestreamConfig,
    /// Cross-node delete fan-out settings.
    #[serde(default)]
    pub fanout: FanoutConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cross-node HTTP fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Per-request timeout for calls to peer worker nodes.
    #[serde(default = "default_fanout_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_fanout_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `MEDIAHUB_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIAHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let mut config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.resolve();
        Ok(config)
    }

    /// Fill settings that default from other sections.
    pub fn resolve(&mut self) {
        self.queue.resolve_for_node(&self.node.public_address);
    }
}

fn default_fanout_timeout() -> u64 {
    10
}
