//! Periodic worker health and resource polling.
//!
//! Each cycle probes every registered worker against the metrics source.
//! A worker that answers is marked UP with a fresh snapshot; any failure
//! marks it DOWN, which also clears its running-job counter. Probes are
//! not retried within a cycle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{debug, info, warn};

use mediahub_core::config::MonitorConfig;
use mediahub_core::error::{AppError, ErrorKind};
use mediahub_core::result::AppResult;
use mediahub_database::store::WorkerStore;
use mediahub_entity::worker::{ResourceSnapshot, WorkerNode};

/// Source of worker liveness and resource figures.
#[async_trait]
pub trait MetricsSource: Send + Sync + 'static {
    /// Whether the worker at `address` is reachable.
    async fn is_up(&self, address: &str) -> AppResult<bool>;

    /// Current resource figures of the worker at `address`.
    async fn snapshot(&self, address: &str) -> AppResult<ResourceSnapshot>;
}

/// [`MetricsSource`] querying a Prometheus-compatible HTTP API fed by
/// node exporters on the workers.
#[derive(Debug, Clone)]
pub struct PrometheusMetricsSource {
    client: reqwest::Client,
    query_url: String,
    exporter_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    data: Option<QueryData>,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    #[serde(default)]
    result: Vec<QueryResult>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    /// `[timestamp, "value"]`
    value: (serde_json::Value, String),
}

impl PrometheusMetricsSource {
    /// Creates a source from the monitor configuration.
    pub fn new(config: &MonitorConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;
        Ok(Self {
            client,
            query_url: config.query_url.clone(),
            exporter_port: config.exporter_port,
        })
    }

    /// Run an instant query and return the first sample rounded to two
    /// decimals, or `None` when the result is empty.
    async fn query(&self, promql: &str) -> AppResult<Option<f64>> {
        let url = reqwest::Url::parse_with_params(&self.query_url, &[("query", promql)])
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Invalid metrics query URL", e)
            })?;

        let body: QueryResponse = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| external("Metrics query failed", e))?
            .json()
            .await
            .map_err(|e| external("Invalid metrics response", e))?;

        let Some(sample) = body.data.and_then(|d| d.result.into_iter().next()) else {
            debug!(query = promql, "Metrics query returned no result");
            return Ok(None);
        };
        let value = sample.value.1.parse::<f64>().map_err(|e| {
            AppError::with_source(ErrorKind::ExternalService, "Non-numeric metrics sample", e)
        })?;
        Ok(Some(round2(value)))
    }

    /// Query a resource figure; failures and empty results read as 0.
    async fn figure(&self, promql: &str) -> f64 {
        match self.query(promql).await {
            Ok(v) => v.unwrap_or(0.0),
            Err(e) => {
                warn!(query = promql, error = %e, "Metrics query failed, using 0");
                0.0
            }
        }
    }
}

#[async_trait]
impl MetricsSource for PrometheusMetricsSource {
    async fn is_up(&self, address: &str) -> AppResult<bool> {
        let instance = instance_label(address, self.exporter_port);
        let up = self.query(&format!("up{{instance=\"{instance}\"}}")).await?;
        Ok(up.is_some_and(|v| v > 0.0))
    }

    async fn snapshot(&self, address: &str) -> AppResult<ResourceSnapshot> {
        let i = instance_label(address, self.exporter_port);
        let fs = format!("instance=\"{i}\",fstype!~\"tmpfs|overlay\"");

        let ram_total = format!("node_memory_MemTotal_bytes{{instance=\"{i}\"}} / 1073741824");
        let ram_used = format!(
            "(1 - (node_memory_MemAvailable_bytes{{instance=\"{i}\"}} / node_memory_MemTotal_bytes{{instance=\"{i}\"}})) * 100"
        );
        let cpu_cores = format!("count(node_cpu_seconds_total{{instance=\"{i}\",mode=\"idle\"}})");
        let cpu_used = format!(
            "100 - (avg by (instance)(irate(node_cpu_seconds_total{{instance=\"{i}\",mode=\"idle\"}}[5m])) * 100)"
        );
        let disk_total = format!("sum(node_filesystem_size_bytes{{{fs}}}) / 1073741824");
        let disk_used = format!(
            "((sum(node_filesystem_size_bytes{{{fs}}}) - sum(node_filesystem_avail_bytes{{{fs}}})) / sum(node_filesystem_size_bytes{{{fs}}})) * 100"
        );

        Ok(ResourceSnapshot {
            ram_total: Some(self.figure(&ram_total).await),
            ram_used_pct: Some(self.figure(&ram_used).await),
            cpu_cores: Some(self.figure(&cpu_cores).await),
            cpu_used_pct: Some(self.figure(&cpu_used).await),
            disk_total: Some(self.figure(&disk_total).await),
            disk_used_pct: Some(self.figure(&disk_used).await),
        })
    }
}

/// Exporter `instance` label for a worker address. With an exporter port
/// configured, the worker's own port is replaced by it.
pub fn instance_label(address: &str, exporter_port: Option<u16>) -> String {
    let bare = address
        .trim()
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');
    match exporter_port {
        None => bare.to_string(),
        Some(port) => {
            let host = match bare.rsplit_once(':') {
                Some((host, p)) if p.parse::<u16>().is_ok() => host,
                _ => bare,
            };
            format!("{host}:{port}")
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn external(message: &str, err: reqwest::Error) -> AppError {
    AppError::with_source(ErrorKind::ExternalService, format!("{message}: {err}"), err)
}

/// Outcome of one collection cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Workers marked UP.
    pub up: usize,
    /// Workers marked DOWN.
    pub down: usize,
    /// Whether the cycle was skipped because the previous one still ran.
    pub skipped: bool,
}

/// Polls every registered worker and writes the results to the registry.
pub struct MetricsCollector {
    workers: Arc<dyn WorkerStore>,
    source: Arc<dyn MetricsSource>,
    config: MonitorConfig,
    running: Mutex<()>,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("interval_seconds", &self.config.interval_seconds)
            .finish()
    }
}

impl MetricsCollector {
    /// Creates a collector.
    pub fn new(
        workers: Arc<dyn WorkerStore>,
        source: Arc<dyn MetricsSource>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            workers,
            source,
            config,
            running: Mutex::new(()),
        }
    }

    /// Run one collection cycle over all workers.
    ///
    /// Cycles never overlap: if the previous one is still in progress this
    /// call returns immediately.
    pub async fn run_cycle(&self) -> AppResult<CycleReport> {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("Previous metrics cycle still running, skipping");
            return Ok(CycleReport {
                skipped: true,
                ..Default::default()
            });
        };

        let workers = self.workers.list().await?;
        let results = join_all(workers.iter().map(|w| self.probe(w))).await;

        let up = results.iter().filter(|up| **up).count();
        let report = CycleReport {
            up,
            down: results.len() - up,
            skipped: false,
        };
        debug!(up = report.up, down = report.down, "Metrics cycle complete");
        Ok(report)
    }

    /// Probe one worker and record the result. Returns whether it is UP.
    async fn probe(&self, worker: &WorkerNode) -> bool {
        let outcome = match self.source.is_up(&worker.address).await {
            Ok(true) => self.source.snapshot(&worker.address).await.map(Some),
            Ok(false) => Ok(None),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(Some(snapshot)) => {
                if let Err(e) = self.workers.mark_up(worker.id, &snapshot).await {
                    warn!(worker = %worker.address, error = %e, "Failed to record worker metrics");
                }
                true
            }
            Ok(None) => {
                self.mark_down(worker, "not reporting").await;
                false
            }
            Err(e) => {
                self.mark_down(worker, &e.to_string()).await;
                false
            }
        }
    }

    async fn mark_down(&self, worker: &WorkerNode, reason: &str) {
        if worker.is_up() {
            warn!(worker = %worker.address, reason, "Worker went DOWN");
        }
        if let Err(e) = self.workers.mark_down(worker.id).await {
            warn!(worker = %worker.address, error = %e, "Failed to mark worker DOWN");
        }
    }

    /// Schedule collection: once after the initial delay, then at every
    /// interval. Returns the running scheduler so the caller can shut it down.
    pub async fn start(self: Arc<Self>) -> AppResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        let first = Arc::clone(&self);
        let initial = CronJob::new_one_shot_async(
            Duration::from_secs(self.config.initial_delay_seconds),
            move |_uuid, _lock| {
                let collector = Arc::clone(&first);
                Box::pin(async move { collector.run_logged().await })
            },
        )
        .map_err(|e| AppError::internal(format!("Failed to create metrics schedule: {e}")))?;

        let every = Arc::clone(&self);
        let repeated = CronJob::new_repeated_async(
            Duration::from_secs(self.config.interval_seconds.max(1)),
            move |_uuid, _lock| {
                let collector = Arc::clone(&every);
                Box::pin(async move { collector.run_logged().await })
            },
        )
        .map_err(|e| AppError::internal(format!("Failed to create metrics schedule: {e}")))?;

        for job in [initial, repeated] {
            scheduler
                .add(job)
                .await
                .map_err(|e| AppError::internal(format!("Failed to add metrics schedule: {e}")))?;
        }
        scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        info!(
            initial_delay_seconds = self.config.initial_delay_seconds,
            interval_seconds = self.config.interval_seconds,
            "Metrics collector scheduled"
        );
        Ok(scheduler)
    }

    async fn run_logged(&self) {
        if let Err(e) = self.run_cycle().await {
            warn!(error = %e, "Metrics cycle failed");
        }
    }
}
