//! Task endpoint (worker): turns a delete request into a queued task.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use mediahub_core::error::AppError;
use mediahub_entity::task::MediaTask;

use crate::dto::request::DeleteTaskRequest;
use crate::dto::response::{ApiResponse, TaskAcceptedResponse};
use crate::error::ApiError;
use crate::extractors::ValidJson;
use crate::state::WorkerState;

/// POST /api/tasks/delete
///
/// 202 once the broker has the task; the files go when the consumer runs it.
pub async fn request_delete(
    State(state): State<WorkerState>,
    ValidJson(req): ValidJson<DeleteTaskRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TaskAcceptedResponse>>), ApiError> {
    let task = MediaTask::Delete {
        video_id: req.video_id,
        username: req.username,
    };
    let action = task.action().to_string();

    if !state.dispatcher.dispatch(task).await {
        return Err(AppError::service_unavailable("Failed to enqueue delete task").into());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(TaskAcceptedResponse {
            action,
            video_id: req.video_id,
        })),
    ))
}
