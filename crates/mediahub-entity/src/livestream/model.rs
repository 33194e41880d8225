//! Livestream session / recording model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use mediahub_core::types::{LivestreamId, UserId};

use crate::video::Privacy;

/// One publish session and, once the DVR file is relocated, its recording.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Livestream {
    /// Unique livestream identifier.
    pub id: LivestreamId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name.
    pub username: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Thumbnail URL.
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: f64,
    /// Address of the node that relayed the stream.
    pub server_location: String,
    /// Visibility.
    pub privacy: Privacy,
    /// Path of the relocated recording; empty until the DVR hook succeeds.
    pub dvr_path: Option<String>,
    /// When publishing started.
    pub uploaded_at: DateTime<Utc>,
    /// When publishing stopped.
    pub ended_at: Option<DateTime<Utc>>,
    /// When the record last changed.
    pub updated_at: DateTime<Utc>,
}

impl Livestream {
    /// Whether `username` owns this livestream.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }
}

/// Data required to open a livestream record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLivestream {
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name.
    pub username: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Relaying node.
    pub server_location: String,
    /// When publishing started.
    pub started_at: DateTime<Utc>,
}
