//! Chunk assembler: concatenates chunks into the final source file.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::info;

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;

use super::store::ChunkFile;

/// Concatenates chunk files into one output file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkAssembler;

impl ChunkAssembler {
    /// Verify that `chunks` holds exactly the indices `0..total`.
    pub fn check_complete(chunks: &[ChunkFile], total: u32) -> AppResult<()> {
        let missing: Vec<u32> = (0..total)
            .filter(|i| !chunks.iter().any(|c| c.index == *i))
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "Upload incomplete, missing chunks: {missing:?}"
            )));
        }
        if let Some(extra) = chunks.iter().find(|c| c.index >= total) {
            return Err(AppError::validation(format!(
                "Chunk {} exceeds declared total of {total}",
                extra.index
            )));
        }
        Ok(())
    }

    /// Concatenate `chunks` in ascending index order into `target`.
    ///
    /// The output is built next to the target and renamed into place, so
    /// a failed merge never leaves a truncated file under the final name.
    /// Returns the number of bytes written.
    pub async fn assemble(&self, chunks: &[ChunkFile], target: &Path) -> AppResult<u64> {
        let mut ordered: Vec<&ChunkFile> = chunks.iter().collect();
        ordered.sort_by_key(|c| c.index);

        info!(
            chunks = ordered.len(),
            target = %target.display(),
            "Assembling chunks"
        );

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to create output directory", e)
            })?;
        }

        let partial = target.with_extension("assembling");
        let result = async {
            let mut out = tokio::fs::File::create(&partial).await?;
            let mut total = 0u64;
            for chunk in &ordered {
                let mut input = tokio::fs::File::open(&chunk.path).await?;
                total += tokio::io::copy(&mut input, &mut out).await?;
            }
            out.flush().await?;
            out.sync_all().await?;
            tokio::fs::rename(&partial, target).await?;
            Ok::<u64, std::io::Error>(total)
        }
        .await;

        match result {
            Ok(bytes) => {
                info!(target = %target.display(), bytes, "Assembly complete");
                Ok(bytes)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to assemble {}", target.display()),
                    e,
                ))
            }
        }
    }
}
