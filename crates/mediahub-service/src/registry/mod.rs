//! Worker registry, metrics collection and load balancing.

pub mod balancer;
pub mod collector;
pub mod service;

pub use balancer::{LoadBalancer, select_worker, utilization_score};
pub use collector::{CycleReport, MetricsCollector, MetricsSource, PrometheusMetricsSource};
pub use service::RegistryService;
