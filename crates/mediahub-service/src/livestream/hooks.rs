//! Webhooks called by the streaming server on a worker node.
//!
//! `on_publish` is the only hook whose reply matters: the streaming server
//! accepts the RTMP session on `code == 0` and drops it otherwise. Every
//! hook is bounded by the configured timeout because the server blocks
//! its handshake on the reply.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::task::TaskTracker;
use tracing::{error, info, instrument, warn};

use mediahub_core::result::AppResult;
use mediahub_core::types::LivestreamId;
use mediahub_database::store::{LivestreamKeyStore, LivestreamStore};
use mediahub_entity::livestream::{CreateLivestream, LivestreamKey};
use mediahub_media::MediaToolkit;
use mediahub_storage::sandbox::reported_file_name;
use mediahub_storage::{SandboxPathMapper, StorageLayout, fs};

use crate::registry::LoadBalancer;

/// Reply body the streaming server expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookReply {
    /// `0` accepts, anything else rejects.
    pub code: i32,
    /// Human-readable detail.
    pub msg: String,
}

impl HookReply {
    /// Accepting reply.
    pub fn ok() -> Self {
        Self {
            code: 0,
            msg: "ok".to_string(),
        }
    }

    /// Rejecting reply.
    pub fn reject(msg: impl Into<String>) -> Self {
        Self {
            code: 1,
            msg: msg.into(),
        }
    }

    /// Whether the reply accepts.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// What happened to a DVR notification.
#[derive(Debug, Clone, PartialEq)]
pub enum DvrOutcome {
    /// Unknown key or no active livestream.
    Discarded,
    /// None of the candidate source paths exists.
    SourceMissing,
    /// The recording was moved and attached.
    Recorded {
        /// Livestream the recording belongs to.
        livestream_id: LivestreamId,
        /// Final location.
        path: PathBuf,
        /// Probed duration in seconds, 0 when probing failed.
        duration: f64,
    },
}

/// Handles publish, unpublish and DVR notifications for this node.
#[derive(Clone)]
pub struct LivestreamHookService {
    keys: Arc<dyn LivestreamKeyStore>,
    streams: Arc<dyn LivestreamStore>,
    layout: StorageLayout,
    mapper: SandboxPathMapper,
    toolkit: Arc<dyn MediaToolkit>,
    balancer: LoadBalancer,
    public_address: String,
    timeout: Duration,
    recordings: TaskTracker,
}

impl std::fmt::Debug for LivestreamHookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LivestreamHookService")
            .field("public_address", &self.public_address)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl LivestreamHookService {
    /// Creates the hook service for the node advertised as `public_address`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        keys: Arc<dyn LivestreamKeyStore>,
        streams: Arc<dyn LivestreamStore>,
        layout: StorageLayout,
        mapper: SandboxPathMapper,
        toolkit: Arc<dyn MediaToolkit>,
        balancer: LoadBalancer,
        public_address: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            keys,
            streams,
            layout,
            mapper,
            toolkit,
            balancer,
            public_address: public_address.into(),
            timeout,
            recordings: TaskTracker::new(),
        }
    }

    /// Authorize a publish and open a livestream record.
    #[instrument(skip(self, stream))]
    pub async fn on_publish(&self, stream: Option<&str>) -> HookReply {
        let Some(stream_key) = non_empty(stream) else {
            return HookReply::reject("No stream key provided");
        };
        match self.bounded("publish", self.publish(stream_key)).await {
            Some(Ok(reply)) => reply,
            Some(Err(e)) => {
                error!(error = %e, "Publish hook failed");
                HookReply::reject("Internal error")
            }
            None => HookReply::reject("Timed out"),
        }
    }

    /// Close the active livestream of a key.
    #[instrument(skip(self, stream))]
    pub async fn on_unpublish(&self, stream: Option<&str>) -> HookReply {
        let Some(stream_key) = non_empty(stream) else {
            return HookReply::ok();
        };
        if let Some(Err(e)) = self.bounded("unpublish", self.unpublish(stream_key)).await {
            error!(error = %e, "Unpublish hook failed");
        }
        HookReply::ok()
    }

    /// Relocate a finished recording and attach it to the active livestream.
    ///
    /// The reply is sent once the key has been resolved; the file move and
    /// probe continue in the background.
    #[instrument(skip(self, stream, file))]
    pub async fn on_dvr(&self, stream: Option<&str>, file: Option<&str>) -> HookReply {
        let (Some(stream_key), Some(file)) = (non_empty(stream), non_empty(file)) else {
            warn!("DVR notification without stream key or file, discarding");
            return HookReply::ok();
        };
        let target = match self.bounded("dvr", self.resolve_dvr_target(stream_key)).await {
            Some(Ok(Some(target))) => target,
            Some(Ok(None)) => return HookReply::ok(),
            Some(Err(e)) => {
                error!(error = %e, "DVR hook failed");
                return HookReply::ok();
            }
            None => return HookReply::ok(),
        };

        let this = self.clone();
        let file = file.to_string();
        self.recordings.spawn(async move {
            if let Err(e) = this.record(target, &file).await {
                error!(file = %file, error = %e, "Failed to store DVR recording");
            }
        });
        HookReply::ok()
    }

    /// Wait for recordings still being relocated.
    pub async fn drain(&self) {
        self.recordings.close();
        if !self.recordings.is_empty() {
            info!(pending = self.recordings.len(), "Waiting for DVR relocations");
        }
        self.recordings.wait().await;
    }

    /// Run the whole DVR flow inline and report its outcome.
    pub async fn process_dvr(&self, stream_key: &str, file: &str) -> AppResult<DvrOutcome> {
        match self.resolve_dvr_target(stream_key).await? {
            Some(target) => self.record(target, file).await,
            None => Ok(DvrOutcome::Discarded),
        }
    }

    async fn publish(&self, stream_key: &str) -> AppResult<HookReply> {
        let Some(key) = self.keys.find_by_stream_key(stream_key).await? else {
            warn!("Publish with unknown stream key rejected");
            return Ok(HookReply::reject("Invalid stream key"));
        };

        let now = Utc::now();
        if key.is_live {
            warn!(user = %key.username, "Key already live, closing previous livestream");
            self.close_active(&key, now).await?;
        }

        let livestream = self
            .streams
            .create(&CreateLivestream {
                user_id: key.user_id,
                username: key.username.clone(),
                title: key
                    .title
                    .clone()
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "Live Stream".to_string()),
                description: key.description.clone().unwrap_or_default(),
                server_location: self.public_address.clone(),
                started_at: now,
            })
            .await?;
        self.keys.mark_live(key.id, livestream.id, now).await?;
        self.balancer.acquire(&self.public_address).await;

        info!(
            user = %key.username,
            livestream_id = %livestream.id,
            "Livestream started"
        );
        Ok(HookReply::ok())
    }

    async fn unpublish(&self, stream_key: &str) -> AppResult<()> {
        let Some(key) = self.keys.find_by_stream_key(stream_key).await? else {
            warn!("Unpublish with unknown stream key ignored");
            return Ok(());
        };
        if !key.is_live {
            info!(user = %key.username, "Unpublish for a key that is not live");
            return Ok(());
        }
        self.close_active(&key, Utc::now()).await
    }

    /// Leave LIVE, stamp the end time and provisional duration, and free
    /// the relaying node's slot.
    async fn close_active(&self, key: &LivestreamKey, now: DateTime<Utc>) -> AppResult<()> {
        self.keys.mark_offline(key.id).await?;

        let Some(livestream_id) = key.current_livestream_id else {
            return Ok(());
        };
        let duration = key
            .publish_started_at
            .map(|started| (now - started).num_milliseconds().max(0) as f64 / 1000.0)
            .unwrap_or(0.0);
        self.streams.finish(livestream_id, now, duration).await?;

        let location = self
            .streams
            .find_by_id(livestream_id)
            .await?
            .map(|ls| ls.server_location)
            .unwrap_or_else(|| self.public_address.clone());
        self.balancer.release(&location).await;

        info!(
            user = %key.username,
            livestream_id = %livestream_id,
            duration,
            "Livestream ended"
        );
        Ok(())
    }

    async fn resolve_dvr_target(&self, stream_key: &str) -> AppResult<Option<DvrTarget>> {
        let Some(key) = self.keys.find_by_stream_key(stream_key).await? else {
            warn!("DVR for unknown stream key discarded");
            return Ok(None);
        };
        let Some(livestream_id) = key.current_livestream_id else {
            warn!(user = %key.username, "DVR without an active livestream discarded");
            return Ok(None);
        };
        Ok(Some(DvrTarget {
            username: key.username,
            livestream_id,
        }))
    }

    async fn record(&self, target: DvrTarget, file: &str) -> AppResult<DvrOutcome> {
        let Some(name) = reported_file_name(file) else {
            warn!(file = %file, "DVR path has no file name, discarding");
            return Ok(DvrOutcome::Discarded);
        };
        let dest = self
            .layout
            .livestream_path(&target.username, target.livestream_id, &name)?;

        let mut source = None;
        for candidate in self.mapper.candidates(file) {
            if fs::exists(&candidate).await {
                source = Some(candidate);
                break;
            }
        }
        let Some(source) = source else {
            warn!(file = %file, "DVR file not found on this node");
            return Ok(DvrOutcome::SourceMissing);
        };

        fs::move_file(&source, &dest).await?;

        let duration = match self.toolkit.probe_duration(&dest).await {
            Ok(d) => d,
            Err(e) => {
                warn!(path = %dest.display(), error = %e, "Cannot probe recording duration");
                0.0
            }
        };
        self.streams
            .set_recording(target.livestream_id, &dest.to_string_lossy(), duration)
            .await?;

        info!(
            livestream_id = %target.livestream_id,
            path = %dest.display(),
            duration,
            "Recording stored"
        );
        Ok(DvrOutcome::Recorded {
            livestream_id: target.livestream_id,
            path: dest,
            duration,
        })
    }

    async fn bounded<T>(&self, hook: &str, fut: impl Future<Output = T>) -> Option<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(hook, timeout_ms = self.timeout.as_millis() as u64, "Hook timed out");
                None
            }
        }
    }
}

#[derive(Debug)]
struct DvrTarget {
    username: String,
    livestream_id: LivestreamId,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use async_trait::async_trait;
    use mediahub_core::types::{UserId, WorkerId};
    use mediahub_database::memory::{MemoryLivestreamKeyStore, MemoryLivestreamStore, MemoryWorkerStore};
    use mediahub_database::store::WorkerStore;
    use mediahub_entity::worker::{ResourceSnapshot, WorkerNode, WorkerStatus};
    use mediahub_media::{HlsOutput, MediaToolError};

    use super::*;

    const NODE: &str = "10.0.0.9:8081";

    struct DurationToolkit;

    #[async_trait]
    impl MediaToolkit for DurationToolkit {
        async fn probe_height(&self, _source: &Path) -> Result<u32, MediaToolError> {
            Ok(720)
        }

        async fn probe_duration(&self, _source: &Path) -> Result<f64, MediaToolError> {
            Ok(93.5)
        }

        async fn generate_thumbnail(
            &self,
            _source: &Path,
            _at_seconds: f64,
            _target: &Path,
        ) -> Result<(), MediaToolError> {
            Ok(())
        }

        async fn transcode_hls(
            &self,
            _source: &Path,
            _height: u32,
            output_dir: &Path,
        ) -> Result<HlsOutput, MediaToolError> {
            Ok(HlsOutput {
                playlist: output_dir.join("x.m3u8"),
                dir: output_dir.to_path_buf(),
            })
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        layout: StorageLayout,
        keys: Arc<MemoryLivestreamKeyStore>,
        streams: Arc<MemoryLivestreamStore>,
        workers: Arc<MemoryWorkerStore>,
        hooks: LivestreamHookService,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(dir.path());
        let keys = Arc::new(MemoryLivestreamKeyStore::new());
        let streams = Arc::new(MemoryLivestreamStore::new());
        let workers = Arc::new(MemoryWorkerStore::new());
        let now = Utc::now();
        workers.insert(WorkerNode {
            id: WorkerId::new(),
            name: "live".into(),
            address: NODE.into(),
            status: WorkerStatus::Up,
            specification: ResourceSnapshot::default(),
            current_load: 0,
            created_at: now,
            updated_at: now,
        });
        let hooks = LivestreamHookService::new(
            keys.clone(),
            streams.clone(),
            layout.clone(),
            SandboxPathMapper::new("/data", dir.path().join("srs")),
            Arc::new(DurationToolkit),
            LoadBalancer::new(workers.clone()),
            NODE,
            Duration::from_secs(2),
        );
        Fixture {
            dir,
            layout,
            keys,
            streams,
            workers,
            hooks,
        }
    }

    async fn key_for(fx: &Fixture, username: &str) -> LivestreamKey {
        fx.keys
            .insert_if_absent(&LivestreamKey::new(UserId::new(), username))
            .await
            .unwrap()
    }

    async fn reload(fx: &Fixture, key: &LivestreamKey) -> LivestreamKey {
        fx.keys.find_by_user_id(key.user_id).await.unwrap().unwrap()
    }

    async fn load(fx: &Fixture) -> i32 {
        fx.workers
            .find_by_address(NODE)
            .await
            .unwrap()
            .unwrap()
            .current_load
    }

    #[tokio::test]
    async fn test_publish_with_unknown_key_is_rejected() {
        let fx = fixture();
        let reply = fx.hooks.on_publish(Some("not-a-key")).await;
        assert_eq!(reply, HookReply::reject("Invalid stream key"));
        assert!(fx.streams.is_empty());
    }

    #[tokio::test]
    async fn test_publish_without_key() {
        let fx = fixture();
        let reply = fx.hooks.on_publish(Some("  ")).await;
        assert_eq!(reply, HookReply::reject("No stream key provided"));
    }

    #[tokio::test]
    async fn test_publish_then_unpublish() {
        let fx = fixture();
        let key = key_for(&fx, "alice").await;

        assert!(fx.hooks.on_publish(Some(&key.stream_key)).await.is_ok());
        let live = reload(&fx, &key).await;
        assert!(live.is_live);
        let ls_id = live.current_livestream_id.expect("live key has a livestream");
        assert!(live.publish_started_at.is_some());
        assert_eq!(load(&fx).await, 1);

        let ls = fx.streams.find_by_id(ls_id).await.unwrap().unwrap();
        assert_eq!(ls.title, "Live Stream");
        assert_eq!(ls.server_location, NODE);

        assert!(fx.hooks.on_unpublish(Some(&key.stream_key)).await.is_ok());
        let offline = reload(&fx, &key).await;
        assert!(!offline.is_live);
        assert_eq!(offline.current_livestream_id, None);
        assert_eq!(offline.publish_started_at, None);
        assert_eq!(load(&fx).await, 0);

        let ended = fx.streams.find_by_id(ls_id).await.unwrap().unwrap();
        assert!(ended.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_republish_closes_previous_livestream() {
        let fx = fixture();
        let key = key_for(&fx, "alice").await;

        fx.hooks.on_publish(Some(&key.stream_key)).await;
        let first = reload(&fx, &key).await.current_livestream_id.unwrap();
        fx.hooks.on_publish(Some(&key.stream_key)).await;
        let second = reload(&fx, &key).await.current_livestream_id.unwrap();

        assert_ne!(first, second);
        assert!(fx.streams.find_by_id(first).await.unwrap().unwrap().ended_at.is_some());
        assert_eq!(load(&fx).await, 1);
    }

    #[tokio::test]
    async fn test_unpublish_unknown_key_is_accepted() {
        let fx = fixture();
        assert!(fx.hooks.on_unpublish(Some("nope")).await.is_ok());
    }

    #[tokio::test]
    async fn test_dvr_without_active_livestream_is_discarded() {
        let fx = fixture();
        let key = key_for(&fx, "alice").await;
        let outcome = fx
            .hooks
            .process_dvr(&key.stream_key, "/data/live/rec.flv")
            .await
            .unwrap();
        assert_eq!(outcome, DvrOutcome::Discarded);
        assert!(fx.hooks.on_dvr(Some(&key.stream_key), Some("/data/x.flv")).await.is_ok());
        assert!(fx.streams.is_empty());
    }

    #[tokio::test]
    async fn test_dvr_moves_and_measures_recording() {
        let fx = fixture();
        let key = key_for(&fx, "alice").await;
        fx.hooks.on_publish(Some(&key.stream_key)).await;
        let ls_id = reload(&fx, &key).await.current_livestream_id.unwrap();

        let sandboxed = fx.dir.path().join("srs/live/rec.1700.flv");
        tokio::fs::create_dir_all(sandboxed.parent().unwrap()).await.unwrap();
        tokio::fs::write(&sandboxed, b"flv").await.unwrap();

        let outcome = fx
            .hooks
            .process_dvr(&key.stream_key, "/data/live/rec.1700.flv")
            .await
            .unwrap();

        let expected = fx.layout.livestream_path("alice", ls_id, "rec.1700.flv").unwrap();
        assert_eq!(
            outcome,
            DvrOutcome::Recorded {
                livestream_id: ls_id,
                path: expected.clone(),
                duration: 93.5,
            }
        );
        assert!(expected.exists());
        assert!(!sandboxed.exists());

        let ls = fx.streams.find_by_id(ls_id).await.unwrap().unwrap();
        assert_eq!(ls.dvr_path.as_deref(), Some(&*expected.to_string_lossy()));
        assert_eq!(ls.duration, 93.5);
    }

    #[tokio::test]
    async fn test_dvr_hook_relocation_finishes_on_drain() {
        let fx = fixture();
        let key = key_for(&fx, "alice").await;
        fx.hooks.on_publish(Some(&key.stream_key)).await;
        let ls_id = reload(&fx, &key).await.current_livestream_id.unwrap();

        let sandboxed = fx.dir.path().join("srs/live/rec.1800.flv");
        tokio::fs::create_dir_all(sandboxed.parent().unwrap()).await.unwrap();
        tokio::fs::write(&sandboxed, b"flv").await.unwrap();

        let reply = fx
            .hooks
            .on_dvr(Some(&key.stream_key), Some("/data/live/rec.1800.flv"))
            .await;
        assert!(reply.is_ok());

        fx.hooks.drain().await;

        let expected = fx.layout.livestream_path("alice", ls_id, "rec.1800.flv").unwrap();
        assert!(expected.exists());
        let ls = fx.streams.find_by_id(ls_id).await.unwrap().unwrap();
        assert_eq!(ls.dvr_path.as_deref(), Some(&*expected.to_string_lossy()));
        assert_eq!(ls.duration, 93.5);
    }

    #[tokio::test]
    async fn test_dvr_with_missing_file() {
        let fx = fixture();
        let key = key_for(&fx, "alice").await;
        fx.hooks.on_publish(Some(&key.stream_key)).await;

        let outcome = fx
            .hooks
            .process_dvr(&key.stream_key, "/data/live/gone.flv")
            .await
            .unwrap();
        assert_eq!(outcome, DvrOutcome::SourceMissing);
    }

    #[tokio::test]
    async fn test_rotation_keeps_session_under_new_key() {
        // The old secret no longer resolves once rotated.
        let fx = fixture();
        let key = key_for(&fx, "alice").await;
        fx.hooks.on_publish(Some(&key.stream_key)).await;
        fx.keys.rotate(key.id, "fresh-key").await.unwrap();

        fx.hooks.on_unpublish(Some(&key.stream_key)).await;
        assert!(reload(&fx, &key).await.is_live);

        fx.hooks.on_unpublish(Some("fresh-key")).await;
        assert!(!reload(&fx, &key).await.is_live);
    }
}
