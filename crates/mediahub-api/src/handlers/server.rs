//! Worker registry handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use mediahub_core::types::WorkerId;

use crate::dto::request::{RegisterServerRequest, UpdateServerRequest};
use crate::dto::response::{ApiResponse, AssignmentResponse, MessageResponse, ServerResponse};
use crate::error::ApiError;
use crate::extractors::{ValidJson, parse_id};
use crate::state::CoordinatorState;

/// GET /api/servers
pub async fn list_servers(
    State(state): State<CoordinatorState>,
) -> Result<Json<ApiResponse<Vec<ServerResponse>>>, ApiError> {
    let servers = state.registry.list().await?;
    Ok(Json(ApiResponse::ok(
        servers.into_iter().map(ServerResponse::from).collect(),
    )))
}

/// POST /api/servers
pub async fn register_server(
    State(state): State<CoordinatorState>,
    ValidJson(req): ValidJson<RegisterServerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ServerResponse>>), ApiError> {
    let server = state.registry.register(&req.name, &req.address).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(server.into()))))
}

/// GET /api/servers/{id}
pub async fn get_server(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ServerResponse>>, ApiError> {
    let id: WorkerId = parse_id(&id)?;
    let server = state.registry.get(id).await?;
    Ok(Json(ApiResponse::ok(server.into())))
}

/// PUT /api/servers/{id}
pub async fn update_server(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateServerRequest>,
) -> Result<Json<ApiResponse<ServerResponse>>, ApiError> {
    let id: WorkerId = parse_id(&id)?;
    let server = state.registry.update(id, &req.name, &req.address).await?;
    Ok(Json(ApiResponse::ok(server.into())))
}

/// DELETE /api/servers/{id}
pub async fn delete_server(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: WorkerId = parse_id(&id)?;
    state.registry.delete(id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Server deleted"))))
}

/// GET /api/servers/assign
///
/// Reports the least-loaded UP worker without counting work against it.
pub async fn assign_server(
    State(state): State<CoordinatorState>,
) -> Result<Json<ApiResponse<AssignmentResponse>>, ApiError> {
    let worker = state.balancer.select().await?;
    Ok(Json(ApiResponse::ok(AssignmentResponse {
        address: worker.address,
    })))
}
