//! Ingest and playback URLs handed to broadcasters and viewers.

use mediahub_core::config::LivestreamConfig;
use mediahub_entity::worker::http_base_url;

/// Builds RTMP ingest and HTTP-FLV playback URLs for a node.
#[derive(Debug, Clone)]
pub struct StreamEndpoints {
    rtmp_port: u16,
    app: String,
}

impl StreamEndpoints {
    /// Creates the builder from the livestream configuration.
    pub fn new(config: &LivestreamConfig) -> Self {
        Self {
            rtmp_port: config.rtmp_port,
            app: config.app.trim_matches('/').to_string(),
        }
    }

    /// `rtmp://<host>:<rtmp_port>/<app>` for the node at `address`.
    pub fn ingest_url(&self, address: &str) -> String {
        format!("rtmp://{}:{}/{}", host_of(address), self.rtmp_port, self.app)
    }

    /// `http://<address>/<app>/<stream_key>.flv`.
    pub fn playback_url(&self, address: &str, stream_key: &str) -> String {
        format!("{}/{}/{stream_key}.flv", http_base_url(address), self.app)
    }
}

/// Strip scheme, path and port from a node address.
fn host_of(address: &str) -> &str {
    let bare = address.trim();
    let bare = bare
        .strip_prefix("http://")
        .or_else(|| bare.strip_prefix("https://"))
        .unwrap_or(bare);
    let bare = bare.split('/').next().unwrap_or(bare);
    match bare.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => bare,
    }
}
