//! Streaming-server webhook handlers (worker).
//!
//! Replies are always HTTP 200; acceptance is carried in the body `code`.

use axum::Json;
use axum::extract::State;
use tracing::debug;

use mediahub_service::HookReply;

use crate::dto::request::StreamHookRequest;
use crate::state::WorkerState;

/// POST /api/livestreams/hooks/publish
pub async fn on_publish(
    State(state): State<WorkerState>,
    Json(req): Json<StreamHookRequest>,
) -> Json<HookReply> {
    debug!(client_id = ?req.client_id, ip = ?req.ip, app = ?req.app, "on_publish");
    Json(state.hooks.on_publish(req.stream.as_deref()).await)
}

/// POST /api/livestreams/hooks/unpublish
pub async fn on_unpublish(
    State(state): State<WorkerState>,
    Json(req): Json<StreamHookRequest>,
) -> Json<HookReply> {
    debug!(client_id = ?req.client_id, app = ?req.app, "on_unpublish");
    Json(state.hooks.on_unpublish(req.stream.as_deref()).await)
}

/// POST /api/livestreams/hooks/dvr
pub async fn on_dvr(
    State(state): State<WorkerState>,
    Json(req): Json<StreamHookRequest>,
) -> Json<HookReply> {
    debug!(client_id = ?req.client_id, file = ?req.file, "on_dvr");
    Json(
        state
            .hooks
            .on_dvr(req.stream.as_deref(), req.file.as_deref())
            .await,
    )
}
