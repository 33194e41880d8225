//! [`MediaToolkit`] backed by the `ffmpeg` and `ffprobe` executables.

use std::path::Path;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use mediahub_core::config::MediaConfig;

use crate::error::MediaToolError;
use crate::parse::{format_timestamp, parse_duration, parse_height, stderr_tail};
use crate::toolkit::{HlsOutput, MediaToolkit};

/// Runs the configured `ffmpeg`/`ffprobe` binaries as child processes.
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffmpeg: String,
    ffprobe: String,
    segment_seconds: u32,
}

impl FfmpegToolkit {
    /// Create a toolkit from configuration.
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            ffprobe: config.ffprobe_path.clone(),
            segment_seconds: config.hls_segment_seconds,
        }
    }

    async fn run(&self, program: &str, command: &mut Command) -> Result<Output, MediaToolError> {
        let output = command.kill_on_drop(true).output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MediaToolError::CommandNotFound {
                    program: program.to_string(),
                }
            } else {
                MediaToolError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(MediaToolError::ProcessFailed {
                program: program.to_string(),
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_height(&self, source: &Path) -> Result<u32, MediaToolError> {
        let output = self
            .run(
                &self.ffprobe,
                Command::new(&self.ffprobe)
                    .args(["-v", "error", "-select_streams", "v:0"])
                    .args(["-show_entries", "stream=width,height"])
                    .args(["-of", "csv=s=x:p=0"])
                    .arg(source),
            )
            .await?;
        parse_height(&String::from_utf8_lossy(&output.stdout))
    }

    async fn probe_duration(&self, source: &Path) -> Result<f64, MediaToolError> {
        let output = self
            .run(
                &self.ffprobe,
                Command::new(&self.ffprobe)
                    .args(["-v", "error"])
                    .args(["-show_entries", "format=duration"])
                    .args(["-of", "default=noprint_wrappers=1:nokey=1"])
                    .arg(source),
            )
            .await?;
        parse_duration(&String::from_utf8_lossy(&output.stdout))
    }

    #[instrument(skip(self), fields(source = %source.display()))]
    async fn generate_thumbnail(
        &self,
        source: &Path,
        at_seconds: f64,
        target: &Path,
    ) -> Result<(), MediaToolError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        self.run(
            &self.ffmpeg,
            Command::new(&self.ffmpeg)
                .args(["-y", "-ss", format_timestamp(at_seconds).as_str(), "-i"])
                .arg(source)
                .args(["-frames:v", "1", "-q:v", "2"])
                .arg(target),
        )
        .await?;

        if !tokio::fs::try_exists(target).await.unwrap_or(false) {
            return Err(MediaToolError::OutputMissing {
                path: target.to_path_buf(),
            });
        }
        debug!(target = %target.display(), "Thumbnail written");
        Ok(())
    }

    #[instrument(skip(self), fields(source = %source.display()))]
    async fn transcode_hls(
        &self,
        source: &Path,
        height: u32,
        output_dir: &Path,
    ) -> Result<HlsOutput, MediaToolError> {
        tokio::fs::create_dir_all(output_dir).await?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        let playlist = output_dir.join(format!("{stem}_{height}p.m3u8"));
        let segments = output_dir.join(format!("{stem}_{height}p_%06d.ts"));

        info!(height, output = %playlist.display(), "Starting HLS transcode");

        self.run(
            &self.ffmpeg,
            Command::new(&self.ffmpeg)
                .args(["-y", "-i"])
                .arg(source)
                .args(["-vf", format!("scale=-2:{height}").as_str()])
                .args(["-c:v", "libx264", "-c:a", "aac", "-f", "hls"])
                .args(["-hls_time", self.segment_seconds.to_string().as_str()])
                .args(["-hls_playlist_type", "vod", "-hls_segment_filename"])
                .arg(&segments)
                .arg(&playlist),
        )
        .await?;

        if !tokio::fs::try_exists(&playlist).await.unwrap_or(false) {
            return Err(MediaToolError::OutputMissing { path: playlist });
        }

        Ok(HlsOutput {
            playlist,
            dir: output_dir.to_path_buf(),
        })
    }
}
