//! Coordinator-side livestream management: per-user keys, channel status
//! and recordings.

use std::sync::Arc;

use tracing::{info, instrument};

use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::LivestreamId;
use mediahub_database::store::{LivestreamKeyStore, LivestreamStore};
use mediahub_entity::livestream::{Livestream, LivestreamKey, generate_stream_key};

use super::endpoints::StreamEndpoints;
use crate::context::Caller;
use crate::registry::LoadBalancer;

/// A user's own key, with the playback URL while live.
#[derive(Debug, Clone)]
pub struct KeyOverview {
    /// The key, secret included.
    pub key: LivestreamKey,
    /// Playback URL of the active session.
    pub stream_endpoint: Option<String>,
}

/// Everything a broadcaster needs to go live.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// The key, secret included.
    pub key: LivestreamKey,
    /// Node that relays the stream.
    pub server_address: String,
    /// RTMP ingest URL.
    pub ingest_url: String,
    /// HTTP-FLV playback URL.
    pub playback_url: String,
}

/// Public view of a user's channel.
#[derive(Debug, Clone)]
pub enum ChannelState {
    /// The user never created a key.
    Unknown,
    /// Not publishing.
    Offline,
    /// Marked live but the relaying node cannot be determined.
    Unavailable,
    /// Publishing.
    Live {
        /// The user's key.
        key: LivestreamKey,
        /// Playback URL.
        stream_endpoint: String,
    },
}

/// Manages livestream keys and livestream records.
#[derive(Clone)]
pub struct LivestreamKeyService {
    keys: Arc<dyn LivestreamKeyStore>,
    streams: Arc<dyn LivestreamStore>,
    balancer: LoadBalancer,
    endpoints: StreamEndpoints,
    recordings_limit: u32,
}

impl std::fmt::Debug for LivestreamKeyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivestreamKeyService")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl LivestreamKeyService {
    /// Creates the service.
    pub fn new(
        keys: Arc<dyn LivestreamKeyStore>,
        streams: Arc<dyn LivestreamStore>,
        balancer: LoadBalancer,
        endpoints: StreamEndpoints,
        recordings_limit: u32,
    ) -> Self {
        Self {
            keys,
            streams,
            balancer,
            endpoints,
            recordings_limit: recordings_limit.max(1),
        }
    }

    /// The caller's key, created on first use.
    pub async fn get_or_create(&self, caller: &Caller) -> AppResult<LivestreamKey> {
        if let Some(key) = self.keys.find_by_user_id(caller.user_id).await? {
            return Ok(key);
        }
        let key = self
            .keys
            .insert_if_absent(&LivestreamKey::new(caller.user_id, caller.username.clone()))
            .await?;
        info!(user = %caller.username, "Livestream key created");
        Ok(key)
    }

    /// The caller's key plus the playback URL while live.
    pub async fn overview(&self, caller: &Caller) -> AppResult<KeyOverview> {
        let key = self.get_or_create(caller).await?;
        let stream_endpoint = self.live_endpoint(&key).await?;
        Ok(KeyOverview {
            key,
            stream_endpoint,
        })
    }

    /// Set the title and description used for the next livestream.
    pub async fn setup(
        &self,
        caller: &Caller,
        title: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<LivestreamKey> {
        let key = self.get_or_create(caller).await?;
        self.keys
            .update_info(key.id, title, description)
            .await?
            .ok_or_else(|| AppError::not_found("Livestream key not found"))
    }

    /// Replace the caller's secret. An active publish session continues.
    #[instrument(skip(self, caller), fields(user = %caller.username))]
    pub async fn reset_key(&self, caller: &Caller) -> AppResult<LivestreamKey> {
        let key = self.get_or_create(caller).await?;
        let rotated = self
            .keys
            .rotate(key.id, &generate_stream_key())
            .await?
            .ok_or_else(|| AppError::not_found("Livestream key not found"))?;
        info!(was_live = rotated.is_live, "Stream key rotated");
        Ok(rotated)
    }

    /// Ingest details for the caller. While live the relaying node is
    /// reused; otherwise the balancer picks one.
    pub async fn stream_info(&self, caller: &Caller) -> AppResult<StreamInfo> {
        let key = self.get_or_create(caller).await?;

        let current = match key.current_livestream_id {
            Some(id) => self.streams.find_by_id(id).await?,
            None => None,
        };
        let server_address = match current
            .map(|ls| ls.server_location)
            .filter(|loc| !loc.trim().is_empty())
        {
            Some(loc) => loc,
            None => self.balancer.select().await?.address,
        };

        Ok(StreamInfo {
            ingest_url: self.endpoints.ingest_url(&server_address),
            playback_url: self.endpoints.playback_url(&server_address, &key.stream_key),
            server_address,
            key,
        })
    }

    /// Whether `username` is publishing.
    pub async fn is_live(&self, username: &str) -> AppResult<bool> {
        Ok(self
            .keys
            .find_by_username(username)
            .await?
            .is_some_and(|k| k.is_live))
    }

    /// Public channel view of `username`.
    pub async fn channel(&self, username: &str) -> AppResult<ChannelState> {
        let Some(key) = self.keys.find_by_username(username).await? else {
            return Ok(ChannelState::Unknown);
        };
        if !key.is_live {
            return Ok(ChannelState::Offline);
        }
        Ok(match self.live_endpoint(&key).await? {
            Some(stream_endpoint) => ChannelState::Live {
                key,
                stream_endpoint,
            },
            None => ChannelState::Unavailable,
        })
    }

    /// Recordings of `username`, newest first.
    pub async fn recordings(&self, username: &str, limit: Option<u32>) -> AppResult<Vec<Livestream>> {
        let limit = limit.unwrap_or(self.recordings_limit);
        if limit == 0 {
            return Err(AppError::validation("limit must be at least 1"));
        }
        self.streams.list_recordings(username, limit).await
    }

    /// Fetch a livestream record.
    pub async fn get_livestream(&self, id: LivestreamId) -> AppResult<Livestream> {
        self.streams
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Livestream not found"))
    }

    /// Change title and description of a livestream the caller owns.
    pub async fn update_livestream(
        &self,
        caller: &Caller,
        id: LivestreamId,
        title: &str,
        description: &str,
    ) -> AppResult<Livestream> {
        let stream = self.get_livestream(id).await?;
        if !stream.is_owned_by(&caller.username) {
            return Err(AppError::authorization(
                "You do not have permission to update this livestream",
            ));
        }
        self.streams
            .update_metadata(id, title, description)
            .await?
            .ok_or_else(|| AppError::not_found("Livestream not found"))
    }

    /// Delete a livestream the caller owns. The active session of a key
    /// cannot be deleted.
    #[instrument(skip(self, caller), fields(user = %caller.username))]
    pub async fn delete_livestream(&self, caller: &Caller, id: LivestreamId) -> AppResult<()> {
        let stream = self.get_livestream(id).await?;
        if !stream.is_owned_by(&caller.username) {
            return Err(AppError::authorization(
                "You do not have permission to delete this livestream",
            ));
        }
        let active = self
            .keys
            .find_by_username(&stream.username)
            .await?
            .is_some_and(|k| k.current_livestream_id == Some(id));
        if active {
            return Err(AppError::conflict("Livestream is currently live"));
        }
        self.streams.delete(id).await?;
        info!(livestream_id = %id, "Livestream deleted");
        Ok(())
    }

    async fn live_endpoint(&self, key: &LivestreamKey) -> AppResult<Option<String>> {
        let Some(id) = key.current_livestream_id.filter(|_| key.is_live) else {
            return Ok(None);
        };
        Ok(self
            .streams
            .find_by_id(id)
            .await?
            .map(|ls| ls.server_location)
            .filter(|loc| !loc.trim().is_empty())
            .map(|loc| self.endpoints.playback_url(&loc, &key.stream_key)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mediahub_core::config::LivestreamConfig;
    use mediahub_core::error::ErrorKind;
    use mediahub_core::types::{UserId, WorkerId};
    use mediahub_database::memory::{MemoryLivestreamKeyStore, MemoryLivestreamStore, MemoryWorkerStore};
    use mediahub_entity::livestream::CreateLivestream;
    use mediahub_entity::worker::{ResourceSnapshot, WorkerNode, WorkerStatus};

    use super::*;

    struct Fixture {
        keys: Arc<MemoryLivestreamKeyStore>,
        streams: Arc<MemoryLivestreamStore>,
        service: LivestreamKeyService,
        caller: Caller,
    }

    fn fixture(workers: &[(&str, WorkerStatus)]) -> Fixture {
        let store = Arc::new(MemoryWorkerStore::new());
        let now = Utc::now();
        for (address, status) in workers {
            store.insert(WorkerNode {
                id: WorkerId::new(),
                name: address.to_string(),
                address: address.to_string(),
                status: *status,
                specification: ResourceSnapshot::default(),
                current_load: 0,
                created_at: now,
                updated_at: now,
            });
        }
        let keys = Arc::new(MemoryLivestreamKeyStore::new());
        let streams = Arc::new(MemoryLivestreamStore::new());
        let service = LivestreamKeyService::new(
            keys.clone(),
            streams.clone(),
            LoadBalancer::new(store),
            StreamEndpoints::new(&LivestreamConfig::default()),
            20,
        );
        Fixture {
            keys,
            streams,
            service,
            caller: Caller::new(UserId::new(), "alice"),
        }
    }

    async fn go_live(fx: &Fixture, location: &str) -> (LivestreamKey, LivestreamId) {
        let key = fx.service.get_or_create(&fx.caller).await.unwrap();
        let ls = fx
            .streams
            .create(&CreateLivestream {
                user_id: fx.caller.user_id,
                username: fx.caller.username.clone(),
                title: "Live Stream".into(),
                description: String::new(),
                server_location: location.into(),
                started_at: Utc::now(),
            })
            .await
            .unwrap();
        fx.keys.mark_live(key.id, ls.id, Utc::now()).await.unwrap();
        (key, ls.id)
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let fx = fixture(&[]);
        let first = fx.service.get_or_create(&fx.caller).await.unwrap();
        let second = fx.service.get_or_create(&fx.caller).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.stream_key, second.stream_key);
        assert!(!first.is_live);
    }

    #[tokio::test]
    async fn test_reset_key_keeps_live_session() {
        let fx = fixture(&[]);
        let (key, ls_id) = go_live(&fx, "node-a:8081").await;

        let rotated = fx.service.reset_key(&fx.caller).await.unwrap();
        assert_ne!(rotated.stream_key, key.stream_key);
        assert!(rotated.is_live);
        assert_eq!(rotated.current_livestream_id, Some(ls_id));
    }

    #[tokio::test]
    async fn test_stream_info_balances_when_offline() {
        let fx = fixture(&[("node-a:8081", WorkerStatus::Down), ("node-b:8081", WorkerStatus::Up)]);
        let info = fx.service.stream_info(&fx.caller).await.unwrap();
        assert_eq!(info.server_address, "node-b:8081");
        assert_eq!(info.ingest_url, "rtmp://node-b:1935/live");
        assert_eq!(
            info.playback_url,
            format!("http://node-b:8081/live/{}.flv", info.key.stream_key)
        );
    }

    #[tokio::test]
    async fn test_stream_info_reuses_live_node() {
        let fx = fixture(&[("node-b:8081", WorkerStatus::Up)]);
        go_live(&fx, "node-c:8081").await;
        let info = fx.service.stream_info(&fx.caller).await.unwrap();
        assert_eq!(info.server_address, "node-c:8081");
    }

    #[tokio::test]
    async fn test_stream_info_without_capacity() {
        let fx = fixture(&[("node-a:8081", WorkerStatus::Down)]);
        let err = fx.service.stream_info(&fx.caller).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoCapacity);
    }

    #[tokio::test]
    async fn test_channel_states() {
        let fx = fixture(&[]);
        assert!(matches!(
            fx.service.channel("alice").await.unwrap(),
            ChannelState::Unknown
        ));
        fx.service.get_or_create(&fx.caller).await.unwrap();
        assert!(matches!(
            fx.service.channel("alice").await.unwrap(),
            ChannelState::Offline
        ));
        let (key, _) = go_live(&fx, "node-a:8081").await;
        match fx.service.channel("alice").await.unwrap() {
            ChannelState::Live { stream_endpoint, .. } => assert_eq!(
                stream_endpoint,
                format!("http://node-a:8081/live/{}.flv", key.stream_key)
            ),
            other => panic!("expected live channel, got {other:?}"),
        }
        assert!(fx.service.is_live("alice").await.unwrap());
    }

    #[tokio::test]
    async fn test_active_livestream_cannot_be_deleted() {
        let fx = fixture(&[]);
        let (key, ls_id) = go_live(&fx, "node-a:8081").await;

        let err = fx.service.delete_livestream(&fx.caller, ls_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        fx.keys.mark_offline(key.id).await.unwrap();
        fx.service.delete_livestream(&fx.caller, ls_id).await.unwrap();
        assert!(fx.streams.is_empty());
    }

    #[tokio::test]
    async fn test_livestream_owner_checks() {
        let fx = fixture(&[]);
        let (_, ls_id) = go_live(&fx, "node-a:8081").await;
        let other = Caller::new(UserId::new(), "mallory");

        let err = fx
            .service
            .update_livestream(&other, ls_id, "mine", "")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        let err = fx.service.delete_livestream(&other, ls_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let updated = fx
            .service
            .update_livestream(&fx.caller, ls_id, "Evening set", "jazz")
            .await
            .unwrap();
        assert_eq!(updated.title, "Evening set");
    }

    #[tokio::test]
    async fn test_recordings_limit_validation() {
        let fx = fixture(&[]);
        let err = fx.service.recordings("alice", Some(0)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(fx.service.recordings("alice", None).await.unwrap().is_empty());
    }
}
