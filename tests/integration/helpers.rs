//! Shared test helpers for integration tests.
//!
//! Both node roles are assembled from in-memory stores, a fake media
//! toolkit, a recording fan-out client and the in-memory task queue, then
//! driven through their routers with `oneshot`.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediahub_api::{CoordinatorState, WorkerState, coordinator_router, worker_router};
use mediahub_core::config::AppConfig;
use mediahub_core::error::AppError;
use mediahub_core::result::AppResult;
use mediahub_core::types::{UserId, VideoId};
use mediahub_database::memory::{
    MemoryLivestreamKeyStore, MemoryLivestreamStore, MemoryUploadSessionStore, MemoryVideoStore,
    MemoryWorkerStore,
};
use mediahub_database::store::WorkerStore;
use mediahub_entity::task::TaskEnvelope;
use mediahub_entity::worker::{CreateWorker, ResourceSnapshot, WorkerNode};
use mediahub_media::{HlsOutput, MediaToolError, MediaToolkit};
use mediahub_service::{
    ChunkIngestService, LivestreamHookService, LivestreamKeyService, LoadBalancer,
    RegistryService, StreamEndpoints, TaskDispatcher, UploadSessionService, VideoService,
    WorkerClient,
};
use mediahub_storage::{ChunkStore, SandboxPathMapper, StorageLayout};
use mediahub_worker::{MemoryTaskQueue, QueuePublisher, TaskQueue};

/// Address the worker under test advertises.
pub const WORKER_ADDRESS: &str = "10.0.0.9:8081";

/// Configuration with every section at its defaults.
pub fn test_config() -> AppConfig {
    serde_json::from_value(serde_json::json!({
        "database": { "url": "postgres://unused/mediahub" },
        "node": { "public_address": WORKER_ADDRESS },
    }))
    .expect("valid test config")
}

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: UserId,
    pub username: String,
}

impl TestUser {
    pub fn new(username: &str) -> Self {
        Self {
            id: UserId::new(),
            username: username.to_string(),
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `data` member of a success envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// Media toolkit that reports a fixed height and writes placeholder files.
pub struct FakeToolkit {
    pub height: u32,
}

#[async_trait]
impl MediaToolkit for FakeToolkit {
    async fn probe_height(&self, _source: &Path) -> Result<u32, MediaToolError> {
        Ok(self.height)
    }

    async fn probe_duration(&self, _source: &Path) -> Result<f64, MediaToolError> {
        Ok(42.0)
    }

    async fn generate_thumbnail(
        &self,
        _source: &Path,
        _at_seconds: f64,
        target: &Path,
    ) -> Result<(), MediaToolError> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, b"jpg").await?;
        Ok(())
    }

    async fn transcode_hls(
        &self,
        _source: &Path,
        height: u32,
        output_dir: &Path,
    ) -> Result<HlsOutput, MediaToolError> {
        tokio::fs::create_dir_all(output_dir).await?;
        let playlist = output_dir.join(format!("video_{height}p.m3u8"));
        tokio::fs::write(&playlist, b"#EXTM3U").await?;
        Ok(HlsOutput {
            playlist,
            dir: output_dir.to_path_buf(),
        })
    }
}

/// Fan-out client that records calls and fails for chosen locations.
#[derive(Default)]
pub struct RecordingWorkerClient {
    pub calls: Mutex<Vec<(String, VideoId, String)>>,
    pub failing: Mutex<Vec<String>>,
}

impl RecordingWorkerClient {
    pub fn calls(&self) -> Vec<(String, VideoId, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_for(&self, location: &str) {
        self.failing.lock().unwrap().push(location.to_string());
    }
}

#[async_trait]
impl WorkerClient for RecordingWorkerClient {
    async fn request_delete(
        &self,
        location: &str,
        video_id: VideoId,
        username: &str,
    ) -> AppResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((location.to_string(), video_id, username.to_string()));
        if self.failing.lock().unwrap().iter().any(|l| l == location) {
            return Err(AppError::external_service(format!("{location} unreachable")));
        }
        Ok(())
    }
}

/// Register a worker and mark it UP with the given utilization.
pub async fn seed_up_worker(
    workers: &MemoryWorkerStore,
    address: &str,
    cpu: f64,
    ram: f64,
    disk: f64,
) -> WorkerNode {
    let worker = workers
        .create(&CreateWorker {
            name: format!("node-{address}"),
            address: address.to_string(),
        })
        .await
        .unwrap();
    workers
        .mark_up(
            worker.id,
            &ResourceSnapshot {
                cpu_used_pct: Some(cpu),
                ram_used_pct: Some(ram),
                disk_used_pct: Some(disk),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    workers.find_by_id(worker.id).await.unwrap().unwrap()
}

async fn send(router: &Router, req: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("Failed to read body");
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

    TestResponse { status, body }
}

async fn json_request(
    router: &Router,
    method: &str,
    path: &str,
    body: Option<Value>,
    user: Option<&TestUser>,
) -> TestResponse {
    let body_str = body
        .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
        .unwrap_or_default();

    let mut req = Request::builder()
        .method(method)
        .uri(path)
        .header("Content-Type", "application/json");

    if let Some(user) = user {
        req = req
            .header("X-User-Id", user.id.to_string())
            .header("X-Username", &user.username);
    }

    let req = req
        .body(Body::from(body_str))
        .expect("Failed to build request");
    send(router, req).await
}

/// Coordinator node over in-memory stores.
pub struct CoordinatorApp {
    pub router: Router,
    pub workers: Arc<MemoryWorkerStore>,
    pub sessions: Arc<MemoryUploadSessionStore>,
    pub videos: Arc<MemoryVideoStore>,
    pub keys: Arc<MemoryLivestreamKeyStore>,
    pub streams: Arc<MemoryLivestreamStore>,
    pub fanout: Arc<RecordingWorkerClient>,
}

impl CoordinatorApp {
    pub fn new() -> Self {
        let config = test_config();
        let workers = Arc::new(MemoryWorkerStore::new());
        let sessions = Arc::new(MemoryUploadSessionStore::new());
        let videos = Arc::new(MemoryVideoStore::new());
        let keys = Arc::new(MemoryLivestreamKeyStore::new());
        let streams = Arc::new(MemoryLivestreamStore::new());
        let fanout = Arc::new(RecordingWorkerClient::default());

        let balancer = LoadBalancer::new(workers.clone());
        let state = CoordinatorState {
            registry: RegistryService::new(workers.clone()),
            uploads: UploadSessionService::new(sessions.clone(), balancer.clone()),
            videos: VideoService::new(videos.clone(), fanout.clone()),
            livestreams: LivestreamKeyService::new(
                keys.clone(),
                streams.clone(),
                balancer.clone(),
                StreamEndpoints::new(&config.livestream),
                config.livestream.recordings_limit,
            ),
            balancer,
            config: Arc::new(config),
        };

        Self {
            router: coordinator_router(state),
            workers,
            sessions,
            videos,
            keys,
            streams,
            fanout,
        }
    }

    /// Make an HTTP request to the coordinator
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<&TestUser>,
    ) -> TestResponse {
        json_request(&self.router, method, path, body, user).await
    }
}

/// Worker node over in-memory stores and a temporary storage root.
pub struct WorkerApp {
    pub router: Router,
    pub workers: Arc<MemoryWorkerStore>,
    pub sessions: Arc<MemoryUploadSessionStore>,
    pub videos: Arc<MemoryVideoStore>,
    pub keys: Arc<MemoryLivestreamKeyStore>,
    pub streams: Arc<MemoryLivestreamStore>,
    pub queue: Arc<MemoryTaskQueue>,
    pub layout: StorageLayout,
    pub storage: TempDir,
}

impl WorkerApp {
    pub fn new(source_height: u32) -> Self {
        let config = test_config();
        let storage = tempfile::tempdir().expect("temp storage root");
        let layout = StorageLayout::new(storage.path());

        let workers = Arc::new(MemoryWorkerStore::new());
        let sessions = Arc::new(MemoryUploadSessionStore::new());
        let videos = Arc::new(MemoryVideoStore::new());
        let keys = Arc::new(MemoryLivestreamKeyStore::new());
        let streams = Arc::new(MemoryLivestreamStore::new());
        let queue = Arc::new(MemoryTaskQueue::new());

        let toolkit: Arc<dyn MediaToolkit> = Arc::new(FakeToolkit {
            height: source_height,
        });
        let balancer = LoadBalancer::new(workers.clone());
        let dispatcher = TaskDispatcher::new(Arc::new(QueuePublisher::new(queue.clone())));

        let state = WorkerState {
            ingest: ChunkIngestService::new(
                sessions.clone(),
                videos.clone(),
                ChunkStore::new(layout.clone()),
                toolkit.clone(),
                dispatcher.clone(),
                balancer.clone(),
                WORKER_ADDRESS,
            ),
            dispatcher,
            hooks: LivestreamHookService::new(
                keys.clone(),
                streams.clone(),
                layout.clone(),
                SandboxPathMapper::new(
                    config.storage.sandbox_prefix.clone(),
                    layout.root().join(&config.storage.sandbox_mount),
                ),
                toolkit,
                balancer,
                WORKER_ADDRESS,
                Duration::from_millis(config.livestream.hook_timeout_ms),
            ),
            config: Arc::new(config),
        };

        Self {
            router: worker_router(state),
            workers,
            sessions,
            videos,
            keys,
            streams,
            queue,
            layout,
            storage,
        }
    }

    /// Make a JSON request to the worker
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        user: Option<&TestUser>,
    ) -> TestResponse {
        json_request(&self.router, method, path, body, user).await
    }

    /// Upload one chunk as a multipart form, binary part first.
    pub async fn upload_chunk(
        &self,
        session_id: &str,
        user: &TestUser,
        data: &[u8],
        fields: &[(&str, String)],
    ) -> TestResponse {
        const BOUNDARY: &str = "mediahub-test-boundary";

        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"blob\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(format!("/api/uploads/{session_id}"))
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("X-User-Id", user.id.to_string())
            .header("X-Username", &user.username)
            .body(Body::from(body))
            .expect("Failed to build request");
        send(&self.router, req).await
    }

    /// Drain every task currently on the queue.
    pub async fn drain_tasks(&self) -> Vec<TaskEnvelope> {
        let mut tasks = Vec::new();
        while let Some(delivery) = self.queue.receive().await.unwrap() {
            tasks.push(serde_json::from_str(&delivery.payload).unwrap());
        }
        tasks
    }
}
