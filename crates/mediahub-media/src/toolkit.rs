//! The media toolkit abstraction used by upload and livestream flows.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::MediaToolError;

/// Files produced by one HLS transcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsOutput {
    /// The `.m3u8` playlist.
    pub playlist: PathBuf,
    /// Directory holding the playlist and its segments.
    pub dir: PathBuf,
}

/// Probing, thumbnailing and transcoding of media files.
#[async_trait]
pub trait MediaToolkit: Send + Sync + 'static {
    /// Pixel height of the first video stream.
    async fn probe_height(&self, source: &Path) -> Result<u32, MediaToolError>;

    /// Container duration in seconds.
    async fn probe_duration(&self, source: &Path) -> Result<f64, MediaToolError>;

    /// Extract one JPEG frame at `at_seconds` into `target`.
    async fn generate_thumbnail(
        &self,
        source: &Path,
        at_seconds: f64,
        target: &Path,
    ) -> Result<(), MediaToolError>;

    /// Transcode `source` to an HLS VOD rendition of the given height in
    /// `output_dir`. Existing files of the same rendition are overwritten.
    async fn transcode_hls(
        &self,
        source: &Path,
        height: u32,
        output_dir: &Path,
    ) -> Result<HlsOutput, MediaToolError>;
}
