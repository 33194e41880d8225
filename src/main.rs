//! MediaHub server: coordinator or worker node of the media platform.
//!
//! Main entry point that wires all crates together and starts the node
//! in the role named by `node.role`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use mediahub_api::{CoordinatorState, WorkerState, coordinator_router, worker_router};
use mediahub_core::config::{AppConfig, NodeRole};
use mediahub_core::error::AppError;
use mediahub_database::DatabasePool;
use mediahub_database::repositories::{
    LivestreamKeyRepository, LivestreamRepository, UploadSessionRepository, VideoRepository,
    WorkerRepository,
};
use mediahub_database::store::{
    LivestreamKeyStore, LivestreamStore, UploadSessionStore, VideoStore, WorkerStore,
};
use mediahub_media::{FfmpegToolkit, MediaToolkit};
use mediahub_service::{
    ChunkIngestService, HttpWorkerClient, LivestreamHookService, LivestreamKeyService,
    LoadBalancer, LocalMediaService, MetricsCollector, PrometheusMetricsSource, RegistryService,
    StreamEndpoints, TaskDispatcher, UploadSessionService, VideoService,
};
use mediahub_storage::{ChunkStore, SandboxPathMapper, StorageLayout};
use mediahub_worker::{MediaTaskHandler, QueuePublisher, RedisStreamQueue, WorkerRunner};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from `config/` and the environment.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("MEDIAHUB_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Stores shared by both roles.
struct Stores {
    workers: Arc<dyn WorkerStore>,
    sessions: Arc<dyn UploadSessionStore>,
    videos: Arc<dyn VideoStore>,
    keys: Arc<dyn LivestreamKeyStore>,
    streams: Arc<dyn LivestreamStore>,
}

impl Stores {
    fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            workers: Arc::new(WorkerRepository::new(pool.clone())),
            sessions: Arc::new(UploadSessionRepository::new(pool.clone())),
            videos: Arc::new(VideoRepository::new(pool.clone())),
            keys: Arc::new(LivestreamKeyRepository::new(pool.clone())),
            streams: Arc::new(LivestreamRepository::new(pool)),
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        role = %config.node.role,
        address = %config.node.public_address,
        "Starting MediaHub v{}",
        env!("CARGO_PKG_VERSION")
    );

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database).await?;
    let stores = Stores::postgres(&db);
    let balancer = LoadBalancer::new(Arc::clone(&stores.workers));

    // ── Step 2: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 3: Role-specific services and background tasks ──────
    let config = Arc::new(config);
    let (app, background) = match config.node.role {
        NodeRole::Coordinator => build_coordinator(&config, &stores, balancer).await?,
        NodeRole::Worker => build_worker(&config, &stores, balancer, shutdown_rx).await?,
    };

    // ── Step 4: Start HTTP server ────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!("MediaHub {} listening on {}", config.node.role, addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 5: Drain background work ────────────────────────────
    background.stop().await;
    db.close().await;
    tracing::info!("MediaHub stopped");
    Ok(())
}

/// Background work owned by a node.
#[derive(Default)]
struct Background {
    scheduler: Option<tokio_cron_scheduler::JobScheduler>,
    consumer: Option<tokio::task::JoinHandle<()>>,
    hooks: Option<LivestreamHookService>,
}

impl Background {
    async fn stop(self) {
        if let Some(mut scheduler) = self.scheduler {
            if let Err(e) = scheduler.shutdown().await {
                tracing::warn!(error = %e, "Failed to stop metrics scheduler");
            }
        }
        if let Some(handle) = self.consumer {
            // The runner finishes its current task before observing the signal.
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Task consumer ended abnormally");
            }
        }
        if let Some(hooks) = self.hooks {
            hooks.drain().await;
        }
    }
}

async fn build_coordinator(
    config: &Arc<AppConfig>,
    stores: &Stores,
    balancer: LoadBalancer,
) -> Result<(Router, Background), AppError> {
    let scheduler = if config.monitor.enabled {
        let source = Arc::new(PrometheusMetricsSource::new(&config.monitor)?);
        let collector = Arc::new(MetricsCollector::new(
            Arc::clone(&stores.workers),
            source,
            config.monitor.clone(),
        ));
        Some(collector.start().await?)
    } else {
        tracing::warn!("Metrics collector disabled; worker status will not change");
        None
    };

    let worker_client = Arc::new(HttpWorkerClient::new(&config.fanout)?);
    let state = CoordinatorState {
        config: Arc::clone(config),
        registry: RegistryService::new(Arc::clone(&stores.workers)),
        uploads: UploadSessionService::new(Arc::clone(&stores.sessions), balancer.clone()),
        videos: VideoService::new(Arc::clone(&stores.videos), worker_client),
        livestreams: LivestreamKeyService::new(
            Arc::clone(&stores.keys),
            Arc::clone(&stores.streams),
            balancer.clone(),
            StreamEndpoints::new(&config.livestream),
            config.livestream.recordings_limit,
        ),
        balancer,
    };

    let background = Background {
        scheduler,
        ..Default::default()
    };
    Ok((coordinator_router(state), background))
}

async fn build_worker(
    config: &Arc<AppConfig>,
    stores: &Stores,
    balancer: LoadBalancer,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(Router, Background), AppError> {
    let layout = StorageLayout::new(&config.storage.root);
    tokio::fs::create_dir_all(layout.root())
        .await
        .map_err(|e| AppError::storage(format!("Failed to create storage root: {e}")))?;

    let toolkit: Arc<dyn MediaToolkit> = Arc::new(FfmpegToolkit::new(&config.media));
    let queue = Arc::new(RedisStreamQueue::connect(&config.redis, &config.queue).await?);
    let dispatcher = TaskDispatcher::new(Arc::new(QueuePublisher::new(queue.clone())));
    let address = config.node.public_address.clone();

    let consumer = if config.queue.enabled {
        let media = LocalMediaService::new(
            Arc::clone(&stores.videos),
            layout.clone(),
            Arc::clone(&toolkit),
            address.clone(),
        );
        let runner = WorkerRunner::new(
            queue,
            Arc::new(MediaTaskHandler::new(media)),
            config.queue.clone(),
        );
        Some(tokio::spawn(async move { runner.run(shutdown_rx).await }))
    } else {
        tracing::warn!("Task consumer disabled; queued tasks wait until it is re-enabled");
        None
    };

    let state = WorkerState {
        config: Arc::clone(config),
        ingest: ChunkIngestService::new(
            Arc::clone(&stores.sessions),
            Arc::clone(&stores.videos),
            ChunkStore::new(layout.clone()),
            Arc::clone(&toolkit),
            dispatcher.clone(),
            balancer.clone(),
            address.clone(),
        ),
        dispatcher,
        hooks: LivestreamHookService::new(
            Arc::clone(&stores.keys),
            Arc::clone(&stores.streams),
            layout.clone(),
            SandboxPathMapper::new(
                config.storage.sandbox_prefix.clone(),
                layout.root().join(&config.storage.sandbox_mount),
            ),
            toolkit,
            balancer,
            address,
            Duration::from_millis(config.livestream.hook_timeout_ms),
        ),
    };

    let background = Background {
        consumer,
        hooks: Some(state.hooks.clone()),
        ..Default::default()
    };
    Ok((worker_router(state), background))
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
