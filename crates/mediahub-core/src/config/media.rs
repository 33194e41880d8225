//! External media tool configuration.

use serde::{Deserialize, Serialize};

/// Paths and options for the ffmpeg toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// ffmpeg executable.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_path: String,
    /// ffprobe executable.
    #[serde(default = "default_ffprobe")]
    pub ffprobe_path: String,
    /// Target HLS segment length in seconds.
    #[serde(default = "default_segment")]
    pub hls_segment_seconds: u32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg(),
            ffprobe_path: default_ffprobe(),
            hls_segment_seconds: default_segment(),
        }
    }
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_segment() -> u32 {
    10
}
