//! Video model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use mediahub_core::types::{UserId, VideoId};

use super::privacy::Privacy;

/// A video and the renditions available for it across the fleet.
///
/// `resolutions` and `server_locations` only ever grow, and they are
/// only changed through the store's set-union operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    /// Unique video identifier.
    pub id: VideoId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name.
    pub username: String,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Public thumbnail URL.
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    pub duration: f64,
    /// Labels of the available renditions, e.g. `"720"`.
    pub resolutions: Vec<String>,
    /// Addresses of the nodes holding at least one rendition.
    pub server_locations: Vec<String>,
    /// Visibility.
    pub privacy: Privacy,
    /// When the video was created.
    pub created_at: DateTime<Utc>,
    /// When the video last changed.
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Whether `username` owns this video.
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }

    /// Whether a rendition with this label has been recorded.
    pub fn has_resolution(&self, label: &str) -> bool {
        self.resolutions.iter().any(|r| r == label)
    }

    /// Distinct locations in first-seen order.
    pub fn distinct_locations(&self) -> Vec<String> {
        let mut seen = Vec::with_capacity(self.server_locations.len());
        for loc in &self.server_locations {
            let loc = loc.trim();
            if !loc.is_empty() && !seen.iter().any(|s: &String| s == loc) {
                seen.push(loc.to_string());
            }
        }
        seen
    }
}

/// Data required to create a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVideo {
    /// Pre-allocated id so that storage paths can be derived first.
    pub id: VideoId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name.
    pub username: String,
    /// Title.
    pub title: String,
    /// Duration in seconds.
    pub duration: f64,
    /// Node holding the raw file.
    pub server_location: String,
    /// Visibility.
    pub privacy: Privacy,
}
