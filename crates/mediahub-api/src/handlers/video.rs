//! Video handlers (coordinator).

use axum::Json;
use axum::extract::{Path, State};

use mediahub_core::types::VideoId;

use crate::dto::response::{ApiResponse, MessageResponse, VideoResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, parse_id};
use crate::state::CoordinatorState;

/// GET /api/videos/{id}
pub async fn get_video(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<VideoResponse>>, ApiError> {
    let id: VideoId = parse_id(&id)?;
    let video = state.videos.get(id).await?;
    Ok(Json(ApiResponse::ok(video.into())))
}

/// DELETE /api/videos/{id}
///
/// Removes the record, then asks every node holding a rendition to drop
/// its files. A 502 means the record is gone but some nodes were not reached.
pub async fn delete_video(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: VideoId = parse_id(&id)?;
    state.videos.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Video deleted"))))
}
