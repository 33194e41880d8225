//! Filesystem helpers shared by the upload, delete and DVR flows.

use std::path::Path;

use tracing::{debug, warn};

use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;

pub use crate::chunked::store::exists;

/// Move `from` to `to`, replacing any existing file.
///
/// Falls back to copy-then-remove when the rename crosses filesystems,
/// which happens when the streaming server's mount is a separate volume.
pub async fn move_file(from: &Path, to: &Path) -> AppResult<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create destination directory", e)
        })?;
    }

    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), to = %to.display(), "Rename crosses devices, copying");
            tokio::fs::copy(from, to).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to copy file", e)
            })?;
            tokio::fs::remove_file(from).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to remove moved file", e)
            })
        }
        Err(e) => Err(AppError::with_source(
            ErrorKind::Storage,
            format!("Failed to move {} to {}", from.display(), to.display()),
            e,
        )),
    }
}

/// Recursively delete `dir`, then delete its parent if that left it empty.
/// A missing `dir` is not an error.
pub async fn remove_tree_and_empty_parent(dir: &Path) -> AppResult<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to remove {}", dir.display()),
                e,
            ));
        }
    }

    if let Some(parent) = dir.parent() {
        // remove_dir only succeeds on an empty directory.
        if let Err(e) = tokio::fs::remove_dir(parent).await {
            if !matches!(
                e.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::DirectoryNotEmpty
            ) {
                warn!(dir = %parent.display(), error = %e, "Failed to prune parent directory");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_move_file_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("in.flv");
        let to = dir.path().join("nested/out.flv");
        tokio::fs::create_dir_all(to.parent().unwrap()).await.unwrap();
        tokio::fs::write(&to, b"old").await.unwrap();
        tokio::fs::write(&from, b"new").await.unwrap();

        move_file(&from, &to).await.unwrap();
        assert!(!exists(&from).await);
        assert_eq!(tokio::fs::read(&to).await.unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_remove_tree_prunes_empty_parent_only() {
        let dir = tempfile::tempdir().unwrap();
        let videos = dir.path().join("videos");
        let a = videos.join("a");
        let b = videos.join("b");
        tokio::fs::create_dir_all(a.join("480")).await.unwrap();
        tokio::fs::create_dir_all(&b).await.unwrap();

        remove_tree_and_empty_parent(&a).await.unwrap();
        assert!(!exists(&a).await);
        assert!(exists(&videos).await);

        remove_tree_and_empty_parent(&b).await.unwrap();
        assert!(!exists(&videos).await);

        // Already gone.
        remove_tree_and_empty_parent(&b).await.unwrap();
    }
}
