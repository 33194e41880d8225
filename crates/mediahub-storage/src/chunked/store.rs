//! Chunk files of in-progress upload sessions.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_core::types::UploadSessionId;

use crate::layout::{CHUNK_PREFIX, StorageLayout};

/// One chunk present on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    /// Chunk index parsed from the file name.
    pub index: u32,
    /// Full path of the chunk.
    pub path: PathBuf,
}

/// Writes, lists and removes chunk files.
///
/// Writes to distinct indices never contend. A chunk is first written to
/// a private temporary file and then renamed over its final name, so a
/// re-sent index replaces the previous copy whole and a concurrent reader
/// never observes a half-written chunk.
#[derive(Debug, Clone)]
pub struct ChunkStore {
    layout: StorageLayout,
}

impl ChunkStore {
    /// Create a chunk store over a layout.
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Persist chunk `index` from an async reader. Returns the bytes written.
    pub async fn write_chunk_from<R>(
        &self,
        username: &str,
        session: UploadSessionId,
        index: u32,
        mut reader: R,
    ) -> AppResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        let dir = self.layout.upload_dir(username, session)?;
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create chunk directory", e)
        })?;

        let final_path = dir.join(StorageLayout::chunk_file_name(index));
        let temp_path = dir.join(format!(".{}.{}.part", index, Uuid::new_v4().simple()));

        let written = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            let n = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, &final_path).await?;
            Ok::<u64, std::io::Error>(n)
        }
        .await;

        match written {
            Ok(n) => {
                debug!(session = %session, index, bytes = n, "Chunk stored");
                Ok(n)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to store chunk {index}"),
                    e,
                ))
            }
        }
    }

    /// Persist chunk `index` from an in-memory buffer.
    pub async fn write_chunk(
        &self,
        username: &str,
        session: UploadSessionId,
        index: u32,
        data: &[u8],
    ) -> AppResult<u64> {
        self.write_chunk_from(username, session, index, data).await
    }

    /// Chunks present for a session, sorted by numeric index.
    pub async fn list_chunks(
        &self,
        username: &str,
        session: UploadSessionId,
    ) -> AppResult<Vec<ChunkFile>> {
        let dir = self.layout.upload_dir(username, session)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::with_source(
                    ErrorKind::Storage,
                    "Failed to list chunk directory",
                    e,
                ));
            }
        };

        let mut chunks = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read chunk directory", e)
        })? {
            let name = entry.file_name();
            if let Some(index) = parse_chunk_index(&name.to_string_lossy()) {
                chunks.push(ChunkFile {
                    index,
                    path: entry.path(),
                });
            }
        }
        chunks.sort_by_key(|c| c.index);
        Ok(chunks)
    }

    /// Remove a session's chunk directory. Failures are logged only.
    pub async fn remove_session(&self, username: &str, session: UploadSessionId) {
        let dir = match self.layout.upload_dir(username, session) {
            Ok(dir) => dir,
            Err(e) => {
                warn!(session = %session, error = %e, "Cannot resolve chunk directory");
                return;
            }
        };
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %e, "Failed to remove chunk directory");
            }
        }
    }

    /// The layout this store writes into.
    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }
}

/// Parse `chunk_000012` into `12`. Temporary and foreign files yield `None`.
fn parse_chunk_index(name: &str) -> Option<u32> {
    name.strip_prefix(CHUNK_PREFIX)?.parse().ok()
}

/// Whether `path` exists on disk.
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
