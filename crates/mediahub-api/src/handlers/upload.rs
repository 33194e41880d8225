//! Upload session handlers (coordinator).

use axum::Json;
use axum::extract::{Path, State};

use mediahub_core::types::UploadSessionId;
use mediahub_service::NewUploadSession;

use crate::dto::request::CreateUploadSessionRequest;
use crate::dto::response::{ApiResponse, UploadSessionCreatedResponse, UploadSessionResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson, parse_id};
use crate::state::CoordinatorState;

/// POST /api/uploads/sessions
pub async fn create_session(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateUploadSessionRequest>,
) -> Result<Json<ApiResponse<UploadSessionCreatedResponse>>, ApiError> {
    let session = state
        .uploads
        .create(
            &auth,
            NewUploadSession {
                file_name: req.file_name,
                file_type: req.file_type,
                file_size: req.file_size,
            },
        )
        .await?;
    Ok(Json(ApiResponse::ok(session.into())))
}

/// GET /api/uploads/sessions/{id}
pub async fn get_session(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UploadSessionResponse>>, ApiError> {
    let id: UploadSessionId = parse_id(&id)?;
    let session = state.uploads.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(session.into())))
}
