//! Work a node performs on the media it stores: producing renditions and
//! removing a video's files.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::VideoId;
use mediahub_database::store::VideoStore;
use mediahub_entity::video::Resolution;
use mediahub_media::MediaToolkit;
use mediahub_storage::{StorageLayout, fs};

/// Executes transcode and delete tasks against this node's storage.
#[derive(Clone)]
pub struct LocalMediaService {
    videos: Arc<dyn VideoStore>,
    layout: StorageLayout,
    toolkit: Arc<dyn MediaToolkit>,
    public_address: String,
}

impl std::fmt::Debug for LocalMediaService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMediaService")
            .field("root", &self.layout.root())
            .field("public_address", &self.public_address)
            .finish()
    }
}

impl LocalMediaService {
    /// Creates the service for the node advertised as `public_address`.
    pub fn new(
        videos: Arc<dyn VideoStore>,
        layout: StorageLayout,
        toolkit: Arc<dyn MediaToolkit>,
        public_address: impl Into<String>,
    ) -> Self {
        Self {
            videos,
            layout,
            toolkit,
            public_address: public_address.into(),
        }
    }

    /// Produce one HLS rendition and record it on the video.
    ///
    /// Redelivery is harmless: the tool overwrites its outputs and the
    /// rendition is unioned into the video's sets. A video deleted while
    /// the task was queued is skipped, and output written for it after the
    /// deletion is removed again.
    #[instrument(skip(self, source, output_dir), fields(resolution = %resolution))]
    pub async fn transcode(
        &self,
        video_id: VideoId,
        source: &Path,
        output_dir: &Path,
        resolution: Resolution,
    ) -> AppResult<()> {
        if self.videos.find_by_id(video_id).await?.is_none() {
            info!(video_id = %video_id, "Video no longer exists, skipping transcode");
            return Ok(());
        }
        if !fs::exists(source).await {
            return Err(AppError::not_found(format!(
                "Source file {} is missing",
                source.display()
            )));
        }

        let output = self
            .toolkit
            .transcode_hls(source, resolution.height(), output_dir)
            .await?;

        self.record_rendition(video_id, resolution, output_dir).await?;
        info!(
            video_id = %video_id,
            playlist = %output.playlist.display(),
            "Rendition ready"
        );
        Ok(())
    }

    /// Union a finished rendition and this node into the video's sets.
    pub async fn record_rendition(
        &self,
        video_id: VideoId,
        resolution: Resolution,
        output_dir: &Path,
    ) -> AppResult<()> {
        let recorded = self
            .videos
            .add_rendition(video_id, resolution.label(), &self.public_address)
            .await?;
        if !recorded {
            warn!(video_id = %video_id, "Video deleted during transcode, discarding output");
            fs::remove_tree_and_empty_parent(output_dir).await?;
        }
        Ok(())
    }

    /// Remove a video's files from this node and its record.
    ///
    /// Returns `false` without touching anything when the record exists
    /// and belongs to someone else. When the record is already gone only
    /// the requester's own directory is searched, so a foreign video can
    /// never be reached.
    #[instrument(skip(self))]
    pub async fn delete_local(&self, video_id: VideoId, username: &str) -> AppResult<bool> {
        let video = self.videos.find_by_id(video_id).await?;
        if let Some(video) = &video {
            if !video.is_owned_by(username) {
                warn!(
                    video_id = %video_id,
                    owner = %video.username,
                    "Delete requested by a user who does not own the video"
                );
                return Ok(false);
            }
        }

        let dir = self.layout.video_dir(username, video_id)?;
        fs::remove_tree_and_empty_parent(&dir).await?;

        if video.is_some() {
            self.videos.delete(video_id).await?;
        }
        info!(video_id = %video_id, dir = %dir.display(), "Local video files removed");
        Ok(true)
    }
}
