//! Chunk ingest and merge (worker side).
//!
//! Chunks are written independently and may arrive in any order or more
//! than once. The request that completes the set claims the session with
//! a compare-and-set and performs the merge: concatenate by index, create
//! the video, drop the chunks, then thumbnail and enqueue one transcode
//! per standard rung below the source height.

use std::path::Path;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{info, instrument, warn};

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::{UploadSessionId, VideoId};
use mediahub_database::store::{UploadSessionStore, VideoStore};
use mediahub_entity::task::MediaTask;
use mediahub_entity::upload::{CompleteUpload, UploadSession, UploadStatus};
use mediahub_entity::video::{CreateVideo, Privacy, Resolution};
use mediahub_entity::worker::http_base_url;
use mediahub_media::{MediaToolkit, thumbnail_timestamp};
use mediahub_storage::{ChunkAssembler, ChunkStore, fs};

use crate::context::Caller;
use crate::dispatch::TaskDispatcher;
use crate::registry::LoadBalancer;

/// Metadata sent with every chunk.
#[derive(Debug, Clone)]
pub struct ChunkMeta {
    /// Index of this chunk, 0-based.
    pub chunk_index: u32,
    /// Declared number of chunks.
    pub total_chunks: u32,
    /// Original file name.
    pub file_name: String,
    /// MIME type.
    pub file_type: Option<String>,
    /// Declared total size in bytes.
    pub file_size: i64,
    /// Declared duration in seconds.
    pub duration: Option<f64>,
}

/// Result of accepting one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkOutcome {
    /// The chunk is stored; the upload is not complete yet (or another
    /// request is merging it).
    Stored {
        /// Index just stored.
        chunk_index: u32,
        /// Declared number of chunks.
        total_chunks: u32,
    },
    /// The upload is assembled and the video exists.
    Completed {
        /// The new video.
        video_id: VideoId,
        /// Number of transcode tasks published by this request.
        transcodes: usize,
    },
}

/// Accepts chunks for sessions assigned to this worker.
#[derive(Clone)]
pub struct ChunkIngestService {
    sessions: Arc<dyn UploadSessionStore>,
    videos: Arc<dyn VideoStore>,
    chunks: ChunkStore,
    toolkit: Arc<dyn MediaToolkit>,
    dispatcher: TaskDispatcher,
    balancer: LoadBalancer,
    public_address: String,
}

impl std::fmt::Debug for ChunkIngestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkIngestService")
            .field("public_address", &self.public_address)
            .finish()
    }
}

impl ChunkIngestService {
    /// Creates a chunk ingest service.
    pub fn new(
        sessions: Arc<dyn UploadSessionStore>,
        videos: Arc<dyn VideoStore>,
        chunks: ChunkStore,
        toolkit: Arc<dyn MediaToolkit>,
        dispatcher: TaskDispatcher,
        balancer: LoadBalancer,
        public_address: impl Into<String>,
    ) -> Self {
        Self {
            sessions,
            videos,
            chunks,
            toolkit,
            dispatcher,
            balancer,
            public_address: public_address.into(),
        }
    }

    /// Store one chunk and merge the upload if it is now complete.
    ///
    /// Re-sending an index overwrites it. A chunk arriving after the merge
    /// reports the existing video.
    #[instrument(skip(self, caller, body), fields(user = %caller.username, chunk = meta.chunk_index))]
    pub async fn save_chunk<R>(
        &self,
        caller: &Caller,
        session_id: UploadSessionId,
        meta: ChunkMeta,
        body: R,
    ) -> AppResult<ChunkOutcome>
    where
        R: AsyncRead + Unpin + Send,
    {
        if meta.total_chunks == 0 {
            return Err(AppError::validation("totalChunks must be at least 1"));
        }
        if meta.chunk_index >= meta.total_chunks {
            return Err(AppError::validation(format!(
                "chunkIndex {} out of range for {} chunks",
                meta.chunk_index, meta.total_chunks
            )));
        }

        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| AppError::not_found("Upload session not found"))?;
        if !session.is_owned_by(caller.user_id) {
            return Err(AppError::authorization("Upload session belongs to another user"));
        }

        match (session.status, session.video_id) {
            (UploadStatus::Completed, Some(video_id)) => {
                return Ok(ChunkOutcome::Completed {
                    video_id,
                    transcodes: 0,
                });
            }
            (UploadStatus::Uploading, _) => {}
            _ => return Ok(stored(&meta)),
        }

        self.chunks
            .write_chunk_from(&session.username, session_id, meta.chunk_index, body)
            .await?;

        let present = self.chunks.list_chunks(&session.username, session_id).await?;
        let complete = (0..meta.total_chunks).all(|i| present.iter().any(|c| c.index == i));
        if !complete {
            return Ok(stored(&meta));
        }

        if !self.sessions.try_begin_assembly(session_id).await? {
            info!(session_id = %session_id, "Merge already claimed by another request");
            return Ok(stored(&meta));
        }

        match self.merge(&session, &meta).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Err(release) = self.sessions.abort_assembly(session_id).await {
                    warn!(session_id = %session_id, error = %release, "Failed to release merge claim");
                }
                Err(e)
            }
        }
    }

    async fn merge(&self, session: &UploadSession, meta: &ChunkMeta) -> AppResult<ChunkOutcome> {
        let username = session.username.as_str();
        let layout = self.chunks.layout();
        let video_id = VideoId::new();

        let chunks: Vec<_> = self
            .chunks
            .list_chunks(username, session.id)
            .await?
            .into_iter()
            .filter(|c| c.index < meta.total_chunks)
            .collect();
        ChunkAssembler::check_complete(&chunks, meta.total_chunks)?;

        let raw = layout.raw_path(username, video_id, &meta.file_name)?;
        let bytes = ChunkAssembler.assemble(&chunks, &raw).await?;

        let duration = meta.duration.filter(|d| d.is_finite() && *d > 0.0);
        self.videos
            .create(&CreateVideo {
                id: video_id,
                user_id: session.user_id,
                username: username.to_string(),
                title: meta.file_name.clone(),
                duration: duration.unwrap_or(0.0),
                server_location: self.public_address.clone(),
                privacy: Privacy::Public,
            })
            .await?;

        let completed = self
            .sessions
            .complete(
                session.id,
                &CompleteUpload {
                    total_chunks: meta.total_chunks as i32,
                    file_name: meta.file_name.clone(),
                    file_type: meta.file_type.clone(),
                    file_size: meta.file_size,
                    duration,
                    video_id,
                },
            )
            .await;
        if let Err(e) = completed {
            self.discard_video(username, video_id).await;
            return Err(e);
        }
        self.balancer.release(&session.server_address).await;

        info!(
            session_id = %session.id,
            video_id = %video_id,
            bytes,
            "Upload assembled"
        );

        self.chunks.remove_session(username, session.id).await;

        let transcodes = self.post_process(username, video_id, &raw, duration).await;
        Ok(ChunkOutcome::Completed {
            video_id,
            transcodes,
        })
    }

    /// Undo a merge whose session could not be completed, so a retry
    /// starts from the chunks alone.
    async fn discard_video(&self, username: &str, video_id: VideoId) {
        if let Err(e) = self.videos.delete(video_id).await {
            warn!(video_id = %video_id, error = %e, "Failed to remove video after aborted merge");
        }
        let removed = match self.chunks.layout().video_dir(username, video_id) {
            Ok(dir) => fs::remove_tree_and_empty_parent(&dir).await,
            Err(e) => Err(e),
        };
        if let Err(e) = removed {
            warn!(video_id = %video_id, error = %e, "Failed to remove assembled file");
        }
    }

    /// Thumbnail and transcode fan-out. Failures here are logged; the
    /// video already exists with its raw rendition.
    async fn post_process(
        &self,
        username: &str,
        video_id: VideoId,
        raw: &Path,
        duration: Option<f64>,
    ) -> usize {
        let layout = self.chunks.layout();

        match layout.thumbnail_path(username, video_id) {
            Ok(target) => {
                let at = thumbnail_timestamp(duration);
                match self.toolkit.generate_thumbnail(raw, at, &target).await {
                    Ok(()) => {
                        let url = format!(
                            "{}/videos/{username}/{video_id}/thumbnail.jpg",
                            http_base_url(&self.public_address)
                        );
                        if let Err(e) = self.videos.set_thumbnail(video_id, &url).await {
                            warn!(video_id = %video_id, error = %e, "Failed to record thumbnail");
                        }
                    }
                    Err(e) => warn!(video_id = %video_id, error = %e, "Thumbnail generation failed"),
                }
            }
            Err(e) => warn!(video_id = %video_id, error = %e, "Cannot resolve thumbnail path"),
        }

        let height = match self.toolkit.probe_height(raw).await {
            Ok(h) => h,
            Err(e) => {
                warn!(video_id = %video_id, error = %e, "Cannot probe source height, skipping transcodes");
                return 0;
            }
        };

        let mut published = 0;
        for resolution in Resolution::rungs_below(height) {
            let output_dir = match layout.rendition_dir(username, video_id, resolution) {
                Ok(dir) => dir,
                Err(e) => {
                    warn!(video_id = %video_id, error = %e, "Cannot resolve rendition directory");
                    continue;
                }
            };
            let task = MediaTask::Transcode {
                video_id,
                source_path: raw.to_string_lossy().into_owned(),
                output_dir: output_dir.to_string_lossy().into_owned(),
                resolution,
            };
            if self.dispatcher.dispatch(task).await {
                published += 1;
            }
        }

        info!(video_id = %video_id, source_height = height, published, "Transcodes enqueued");
        published
    }
}

fn stored(meta: &ChunkMeta) -> ChunkOutcome {
    ChunkOutcome::Stored {
        chunk_index: meta.chunk_index,
        total_chunks: meta.total_chunks,
    }
}
