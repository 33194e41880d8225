//! Store traits consumed by the service layer.
//!
//! Every mutation that more than one node or task can race on is a
//! single trait method, so each implementation can make it atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mediahub_core::result::AppResult;
use mediahub_core::types::{LivestreamId, LivestreamKeyId, UploadSessionId, UserId, VideoId, WorkerId};
use mediahub_entity::livestream::{CreateLivestream, Livestream, LivestreamKey};
use mediahub_entity::upload::{CompleteUpload, CreateUploadSession, UploadSession};
use mediahub_entity::video::{CreateVideo, Video};
use mediahub_entity::worker::{CreateWorker, ResourceSnapshot, WorkerNode};

/// Durable registry of worker nodes.
#[async_trait]
pub trait WorkerStore: Send + Sync + 'static {
    /// All workers in registration order.
    async fn list(&self) -> AppResult<Vec<WorkerNode>>;

    /// Find a worker by id.
    async fn find_by_id(&self, id: WorkerId) -> AppResult<Option<WorkerNode>>;

    /// Find a worker by its network address.
    async fn find_by_address(&self, address: &str) -> AppResult<Option<WorkerNode>>;

    /// Register a worker. Fails with `Conflict` when the address is taken.
    async fn create(&self, data: &CreateWorker) -> AppResult<WorkerNode>;

    /// Change name and address. Fails with `Conflict` when the new address is taken.
    async fn update_identity(
        &self,
        id: WorkerId,
        name: &str,
        address: &str,
    ) -> AppResult<Option<WorkerNode>>;

    /// Deregister a worker. Returns `true` if it existed.
    async fn delete(&self, id: WorkerId) -> AppResult<bool>;

    /// Overwrite the resource snapshot and set status UP.
    async fn mark_up(&self, id: WorkerId, snapshot: &ResourceSnapshot) -> AppResult<()>;

    /// Set status DOWN and clear the running-job counter.
    async fn mark_down(&self, id: WorkerId) -> AppResult<()>;

    /// Add `delta` to the running-job counter of the worker at `address`,
    /// never going below zero. Unknown addresses are ignored.
    async fn adjust_load(&self, address: &str, delta: i32) -> AppResult<()>;
}

/// Upload session persistence.
#[async_trait]
pub trait UploadSessionStore: Send + Sync + 'static {
    /// Open a session in status UPLOADING.
    async fn create(&self, data: &CreateUploadSession) -> AppResult<UploadSession>;

    /// Find a session by id.
    async fn find_by_id(&self, id: UploadSessionId) -> AppResult<Option<UploadSession>>;

    /// Atomically move UPLOADING → ASSEMBLING. Returns `false` if another
    /// caller already claimed the merge or the session is complete.
    async fn try_begin_assembly(&self, id: UploadSessionId) -> AppResult<bool>;

    /// Release a failed claim: ASSEMBLING → UPLOADING.
    async fn abort_assembly(&self, id: UploadSessionId) -> AppResult<()>;

    /// Record final metadata and set COMPLETED.
    async fn complete(&self, id: UploadSessionId, data: &CompleteUpload) -> AppResult<()>;
}

/// Video persistence.
#[async_trait]
pub trait VideoStore: Send + Sync + 'static {
    /// Create a video holding only its raw rendition location.
    async fn create(&self, data: &CreateVideo) -> AppResult<Video>;

    /// Find a video by id.
    async fn find_by_id(&self, id: VideoId) -> AppResult<Option<Video>>;

    /// Set the thumbnail URL.
    async fn set_thumbnail(&self, id: VideoId, url: &str) -> AppResult<()>;

    /// Union `resolution` into the resolution set and `location` into the
    /// location set in one atomic step. Re-applying is a no-op. Returns
    /// `false` if the video does not exist.
    async fn add_rendition(&self, id: VideoId, resolution: &str, location: &str)
    -> AppResult<bool>;

    /// Delete a video record. Returns `true` if it existed.
    async fn delete(&self, id: VideoId) -> AppResult<bool>;
}

/// Livestream key persistence.
#[async_trait]
pub trait LivestreamKeyStore: Send + Sync + 'static {
    /// Find the key owned by a user.
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Option<LivestreamKey>>;

    /// Find the key owned by a username.
    async fn find_by_username(&self, username: &str) -> AppResult<Option<LivestreamKey>>;

    /// Find the key with this secret.
    async fn find_by_stream_key(&self, stream_key: &str) -> AppResult<Option<LivestreamKey>>;

    /// Insert `key` unless the user already has one; return the stored key.
    async fn insert_if_absent(&self, key: &LivestreamKey) -> AppResult<LivestreamKey>;

    /// Replace title and description.
    async fn update_info(
        &self,
        id: LivestreamKeyId,
        title: Option<&str>,
        description: Option<&str>,
    ) -> AppResult<Option<LivestreamKey>>;

    /// Replace the secret. Live state is left untouched.
    async fn rotate(&self, id: LivestreamKeyId, new_key: &str) -> AppResult<Option<LivestreamKey>>;

    /// Enter LIVE: set `is_live`, the current livestream and the start time together.
    async fn mark_live(
        &self,
        id: LivestreamKeyId,
        livestream_id: LivestreamId,
        started_at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Leave LIVE: clear `is_live`, the current livestream and the start time together.
    async fn mark_offline(&self, id: LivestreamKeyId) -> AppResult<()>;
}

/// Livestream record persistence.
#[async_trait]
pub trait LivestreamStore: Send + Sync + 'static {
    /// Open a record with an empty DVR path.
    async fn create(&self, data: &CreateLivestream) -> AppResult<Livestream>;

    /// Find a record by id.
    async fn find_by_id(&self, id: LivestreamId) -> AppResult<Option<Livestream>>;

    /// Record the end of publishing. `duration` is only applied while no
    /// recording has been attached yet.
    async fn finish(&self, id: LivestreamId, ended_at: DateTime<Utc>, duration: f64)
    -> AppResult<()>;

    /// Attach the relocated recording and its probed duration.
    async fn set_recording(&self, id: LivestreamId, dvr_path: &str, duration: f64)
    -> AppResult<()>;

    /// Recordings of a user (DVR path set), newest first.
    async fn list_recordings(&self, username: &str, limit: u32) -> AppResult<Vec<Livestream>>;

    /// Replace title and description.
    async fn update_metadata(
        &self,
        id: LivestreamId,
        title: &str,
        description: &str,
    ) -> AppResult<Option<Livestream>>;

    /// Delete a record. Returns `true` if it existed.
    async fn delete(&self, id: LivestreamId) -> AppResult<bool>;
}
