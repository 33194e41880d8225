//! Route definitions for the MediaHub HTTP API.
//!
//! Routes are grouped by domain and mounted under `/api`. Which groups a
//! node serves depends on its role.

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use mediahub_core::config::CorsConfig;

use crate::handlers;
use crate::state::{CoordinatorState, WorkerState};

/// Router of a coordinator node.
pub fn coordinator_router(state: CoordinatorState) -> Router {
    let max_body = state.config.server.max_body_bytes;
    let cors = build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .merge(server_routes())
        .merge(upload_session_routes())
        .merge(video_routes())
        .merge(livestream_routes())
        .route("/health", get(handlers::health::coordinator_health));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Router of a worker node.
pub fn worker_router(state: WorkerState) -> Router {
    let max_body = state.config.server.max_body_bytes;
    let cors = build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new()
        .route("/uploads/{session_id}", post(handlers::chunk::upload_chunk))
        .route("/tasks/delete", post(handlers::task::request_delete))
        .merge(hook_routes())
        .route("/health", get(handlers::health::worker_health));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Worker registry CRUD and assignment
fn server_routes() -> Router<CoordinatorState> {
    Router::new()
        .route(
            "/servers",
            get(handlers::server::list_servers).post(handlers::server::register_server),
        )
        .route("/servers/assign", get(handlers::server::assign_server))
        .route(
            "/servers/{id}",
            get(handlers::server::get_server)
                .put(handlers::server::update_server)
                .delete(handlers::server::delete_server),
        )
}

/// Upload session creation and lookup
fn upload_session_routes() -> Router<CoordinatorState> {
    Router::new()
        .route(
            "/uploads/sessions",
            post(handlers::upload::create_session),
        )
        .route(
            "/uploads/sessions/{id}",
            get(handlers::upload::get_session),
        )
}

/// Video lookup and delete
fn video_routes() -> Router<CoordinatorState> {
    Router::new().route(
        "/videos/{id}",
        get(handlers::video::get_video).delete(handlers::video::delete_video),
    )
}

/// Livestream keys, channels and recordings
fn livestream_routes() -> Router<CoordinatorState> {
    Router::new()
        .route("/livestream", get(handlers::livestream::get_key))
        .route("/livestream/setup", post(handlers::livestream::setup))
        .route("/livestream/reset-key", post(handlers::livestream::reset_key))
        .route(
            "/livestream/stream-info",
            get(handlers::livestream::stream_info),
        )
        .route(
            "/livestream/status/{username}",
            get(handlers::livestream::live_status),
        )
        .route(
            "/livestream/user/{username}",
            get(handlers::livestream::channel),
        )
        .route(
            "/livestream/user/{username}/recordings",
            get(handlers::livestream::recordings),
        )
        .route(
            "/livestream/{id}",
            get(handlers::livestream::get_livestream)
                .patch(handlers::livestream::update_livestream)
                .delete(handlers::livestream::delete_livestream),
        )
}

/// Streaming-server callbacks (no caller identity)
fn hook_routes() -> Router<WorkerState> {
    Router::new()
        .route("/livestreams/hooks/publish", post(handlers::hook::on_publish))
        .route(
            "/livestreams/hooks/unpublish",
            post(handlers::hook::on_unpublish),
        )
        .route("/livestreams/hooks/dvr", post(handlers::hook::on_dvr))
}

/// Build CORS layer from configuration
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(config.max_age_seconds));

    if config.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}
