//! Directory layout under a node's storage root.
//!
//! ```text
//! <root>/uploads/<user>/<session>/chunk_000000
//! <root>/outputs/<user>/videos/<video>/raw/<file>
//! <root>/outputs/<user>/videos/<video>/<resolution>/
//! <root>/outputs/<user>/videos/<video>/thumbnail.jpg
//! <root>/outputs/<user>/livestreams/<livestream>/<file>
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;

/// Prefix of every chunk file name.
pub const CHUNK_PREFIX: &str = "chunk_";

/// Resolves every storage path of a node.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the chunks of one upload session.
    pub fn upload_dir(&self, username: &str, session: impl Display) -> AppResult<PathBuf> {
        Ok(self
            .root
            .join("uploads")
            .join(segment(username)?)
            .join(session.to_string()))
    }

    /// Chunk file name for an index.
    pub fn chunk_file_name(index: u32) -> String {
        format!("{CHUNK_PREFIX}{index:06}")
    }

    /// Directory holding everything produced for one video.
    pub fn video_dir(&self, username: &str, video: impl Display) -> AppResult<PathBuf> {
        Ok(self.user_videos_dir(username)?.join(video.to_string()))
    }

    /// Directory holding all videos of a user.
    pub fn user_videos_dir(&self, username: &str) -> AppResult<PathBuf> {
        Ok(self
            .root
            .join("outputs")
            .join(segment(username)?)
            .join("videos"))
    }

    /// Location of the assembled source file.
    pub fn raw_path(
        &self,
        username: &str,
        video: impl Display,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        Ok(self
            .video_dir(username, video)?
            .join("raw")
            .join(segment(file_name)?))
    }

    /// Directory receiving one rendition.
    pub fn rendition_dir(
        &self,
        username: &str,
        video: impl Display,
        resolution: impl Display,
    ) -> AppResult<PathBuf> {
        Ok(self.video_dir(username, video)?.join(resolution.to_string()))
    }

    /// Location of a video's thumbnail.
    pub fn thumbnail_path(&self, username: &str, video: impl Display) -> AppResult<PathBuf> {
        Ok(self.video_dir(username, video)?.join("thumbnail.jpg"))
    }

    /// Final location of a livestream recording.
    pub fn livestream_path(
        &self,
        username: &str,
        livestream: impl Display,
        file_name: &str,
    ) -> AppResult<PathBuf> {
        Ok(self
            .root
            .join("outputs")
            .join(segment(username)?)
            .join("livestreams")
            .join(livestream.to_string())
            .join(segment(file_name)?))
    }
}

/// Accept `value` as a single path component.
///
/// User names and client-supplied file names end up inside paths; anything
/// that could climb out of its parent directory is rejected.
fn segment(value: &str) -> AppResult<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\', '\0'])
    {
        return Err(AppError::validation(format!(
            "Invalid path component: {value:?}"
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_file_name_is_zero_padded() {
        assert_eq!(StorageLayout::chunk_file_name(7), "chunk_000007");
        assert_eq!(StorageLayout::chunk_file_name(123456), "chunk_123456");
    }

    #[test]
    fn test_video_paths() {
        let layout = StorageLayout::new("/srv/storage");
        assert_eq!(
            layout.raw_path("alice", "v1", "clip.mp4").unwrap(),
            PathBuf::from("/srv/storage/outputs/alice/videos/v1/raw/clip.mp4")
        );
        assert_eq!(
            layout.rendition_dir("alice", "v1", "480").unwrap(),
            PathBuf::from("/srv/storage/outputs/alice/videos/v1/480")
        );
        assert_eq!(
            layout.thumbnail_path("alice", "v1").unwrap(),
            PathBuf::from("/srv/storage/outputs/alice/videos/v1/thumbnail.jpg")
        );
    }

    #[test]
    fn test_livestream_path() {
        let layout = StorageLayout::new("storage");
        assert_eq!(
            layout.livestream_path("bob", "ls1", "key.1700.flv").unwrap(),
            PathBuf::from("storage/outputs/bob/livestreams/ls1/key.1700.flv")
        );
    }

    #[test]
    fn test_rejects_traversal() {
        let layout = StorageLayout::new("storage");
        assert!(layout.raw_path("alice", "v1", "../../etc/passwd").is_err());
        assert!(layout.upload_dir("..", "s1").is_err());
        assert!(layout.upload_dir("", "s1").is_err());
    }
}
