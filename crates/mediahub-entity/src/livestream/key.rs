//! Per-user ingest key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use mediahub_core::types::{LivestreamId, LivestreamKeyId, UserId};

/// A user's ingest credential and live state.
///
/// `current_livestream_id` is set exactly while `is_live` is true. The
/// store only changes the two together.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LivestreamKey {
    /// Unique key record identifier.
    pub id: LivestreamKeyId,
    /// Owning user.
    pub user_id: UserId,
    /// Owning user's name.
    pub username: String,
    /// Title applied to the next livestream.
    pub title: Option<String>,
    /// Description applied to the next livestream.
    pub description: Option<String>,
    /// Secret the broadcaster publishes with.
    #[serde(skip_serializing)]
    pub stream_key: String,
    /// Whether a publish session is active.
    pub is_live: bool,
    /// Livestream record of the active publish session.
    pub current_livestream_id: Option<LivestreamId>,
    /// When the active publish session started.
    pub publish_started_at: Option<DateTime<Utc>>,
    /// When the key record was created.
    pub created_at: DateTime<Utc>,
    /// When the key record last changed.
    pub updated_at: DateTime<Utc>,
}

impl LivestreamKey {
    /// Build a fresh, offline key for a user.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: LivestreamKeyId::new(),
            user_id,
            username: username.into(),
            title: None,
            description: None,
            stream_key: generate_stream_key(),
            is_live: false,
            current_livestream_id: None,
            publish_started_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generate an unguessable stream key.
pub fn generate_stream_key() -> String {
    Uuid::new_v4().to_string()
}
