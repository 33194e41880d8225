//! Upload session status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "upload_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadStatus {
    /// Accepting chunks.
    Uploading,
    /// One request has claimed the merge; others must not start another.
    Assembling,
    /// Merged into a video. Kept as an audit record.
    Completed,
}

impl UploadStatus {
    /// Whether chunks may still be written.
    pub fn accepts_chunks(&self) -> bool {
        matches!(self, Self::Uploading)
    }

    /// Return the status as an uppercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "UPLOADING",
            Self::Assembling => "ASSEMBLING",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
