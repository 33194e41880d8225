//! Livestream key, channel and recording handlers (coordinator).

use axum::Json;
use axum::extract::{Path, Query, State};

use mediahub_core::types::LivestreamId;
use mediahub_service::ChannelState;

use crate::dto::request::{LivestreamSetupRequest, RecordingsQuery, UpdateLivestreamRequest};
use crate::dto::response::{
    ApiResponse, ChannelResponse, LiveStatusResponse, LivestreamKeyResponse, LivestreamResponse,
    MessageResponse, StreamInfoResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson, parse_id};
use crate::state::CoordinatorState;

/// GET /api/livestream
pub async fn get_key(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<LivestreamKeyResponse>>, ApiError> {
    let overview = state.livestreams.overview(&auth).await?;
    Ok(Json(ApiResponse::ok(LivestreamKeyResponse::new(
        overview.key,
        overview.stream_endpoint,
    ))))
}

/// POST /api/livestream/setup
pub async fn setup(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<LivestreamSetupRequest>,
) -> Result<Json<ApiResponse<LivestreamKeyResponse>>, ApiError> {
    let key = state
        .livestreams
        .setup(&auth, req.title.as_deref(), req.description.as_deref())
        .await?;
    Ok(Json(ApiResponse::ok(LivestreamKeyResponse::new(key, None))))
}

/// POST /api/livestream/reset-key
pub async fn reset_key(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<LivestreamKeyResponse>>, ApiError> {
    let key = state.livestreams.reset_key(&auth).await?;
    Ok(Json(ApiResponse::ok(LivestreamKeyResponse::new(key, None))))
}

/// GET /api/livestream/stream-info
pub async fn stream_info(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<StreamInfoResponse>>, ApiError> {
    let info = state.livestreams.stream_info(&auth).await?;
    Ok(Json(ApiResponse::ok(info.into())))
}

/// GET /api/livestream/status/{username}
pub async fn live_status(
    State(state): State<CoordinatorState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<LiveStatusResponse>>, ApiError> {
    let is_live = state.livestreams.is_live(&username).await?;
    Ok(Json(ApiResponse::ok(LiveStatusResponse { username, is_live })))
}

/// GET /api/livestream/user/{username}
pub async fn channel(
    State(state): State<CoordinatorState>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ChannelResponse>>, ApiError> {
    let channel = state.livestreams.channel(&username).await?;
    Ok(Json(ApiResponse::ok(channel_response(username, channel))))
}

fn channel_response(username: String, channel: ChannelState) -> ChannelResponse {
    let not_live = |username: String, is_live: bool, message: &str| ChannelResponse {
        username,
        is_live,
        message: Some(message.to_string()),
        title: None,
        description: None,
        stream_endpoint: None,
    };

    match channel {
        ChannelState::Unknown => not_live(username, false, "User not found"),
        ChannelState::Offline => not_live(username, false, "User is not currently streaming"),
        ChannelState::Unavailable => not_live(username, true, "Unable to get stream URL"),
        ChannelState::Live {
            key,
            stream_endpoint,
        } => ChannelResponse {
            username: key.username,
            is_live: true,
            message: None,
            title: Some(key.title.unwrap_or_default()),
            description: Some(key.description.unwrap_or_default()),
            stream_endpoint: Some(stream_endpoint),
        },
    }
}

/// GET /api/livestream/user/{username}/recordings?limit=
pub async fn recordings(
    State(state): State<CoordinatorState>,
    Path(username): Path<String>,
    Query(query): Query<RecordingsQuery>,
) -> Result<Json<ApiResponse<Vec<LivestreamResponse>>>, ApiError> {
    let recordings = state.livestreams.recordings(&username, query.limit).await?;
    Ok(Json(ApiResponse::ok(
        recordings.into_iter().map(LivestreamResponse::from).collect(),
    )))
}

/// GET /api/livestream/{id}
pub async fn get_livestream(
    State(state): State<CoordinatorState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<LivestreamResponse>>, ApiError> {
    let id: LivestreamId = parse_id(&id)?;
    let stream = state.livestreams.get_livestream(id).await?;
    Ok(Json(ApiResponse::ok(stream.into())))
}

/// PATCH /api/livestream/{id}
pub async fn update_livestream(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateLivestreamRequest>,
) -> Result<Json<ApiResponse<LivestreamResponse>>, ApiError> {
    let id: LivestreamId = parse_id(&id)?;
    let stream = state
        .livestreams
        .update_livestream(&auth, id, &req.title, &req.description)
        .await?;
    Ok(Json(ApiResponse::ok(stream.into())))
}

/// DELETE /api/livestream/{id}
pub async fn delete_livestream(
    State(state): State<CoordinatorState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id: LivestreamId = parse_id(&id)?;
    state.livestreams.delete_livestream(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Livestream deleted"))))
}
