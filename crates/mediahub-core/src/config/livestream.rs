//! Livestream configuration.

use serde::{Deserialize, Serialize};

/// Livestream ingest and webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivestreamConfig {
    /// RTMP port the streaming server listens on.
    #[serde(default = "default_rtmp_port")]
    pub rtmp_port: u16,
    /// RTMP application name.
    #[serde(default = "default_app")]
    pub app: String,
    /// Upper bound on a webhook's store round-trip. The streaming server
    /// blocks its handshake on the reply.
    #[serde(default = "default_hook_timeout")]
    pub hook_timeout_ms: u64,
    /// Default number of recordings returned per listing.
    #[serde(default = "default_recordings_limit")]
    pub recordings_limit: u32,
}

impl Default for LivestreamConfig {
    fn default() -> Self {
        Self {
            rtmp_port: default_rtmp_port(),
            app: default_app(),
            hook_timeout_ms: default_hook_timeout(),
            recordings_limit: default_recordings_limit(),
        }
    }
}

fn default_rtmp_port() -> u16 {
    1935
}

fn default_app() -> String {
    "live".to_string()
}

fn default_hook_timeout() -> u64 {
    2000
}

fn default_recordings_limit() -> u32 {
    20
}
