//! Health check handlers.

use axum::Json;
use axum::extract::State;

use mediahub_core::config::NodeRole;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::{CoordinatorState, WorkerState};

/// GET /api/health on a coordinator
pub async fn coordinator_health(
    State(_state): State<CoordinatorState>,
) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(health(NodeRole::Coordinator)))
}

/// GET /api/health on a worker
pub async fn worker_health(State(_state): State<WorkerState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(health(NodeRole::Worker)))
}

fn health(role: NodeRole) -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        role: role.to_string(),
    }
}
