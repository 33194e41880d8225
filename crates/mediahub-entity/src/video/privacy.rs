//! Visibility of videos and recordings.

use serde::{Deserialize, Serialize};

/// Who may see a video or recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "privacy", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Privacy {
    /// Listed and visible to everyone.
    #[default]
    Public,
    /// Visible to the owner only.
    Private,
}
