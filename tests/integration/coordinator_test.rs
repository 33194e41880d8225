//! Coordinator API integration tests: registry, placement, upload
//! sessions, video deletion fan-out and livestream keys.

use axum::http::StatusCode;
use serde_json::json;

use mediahub_core::types::VideoId;
use mediahub_database::store::{VideoStore, WorkerStore};
use mediahub_entity::video::{CreateVideo, Privacy};

use crate::helpers::{CoordinatorApp, TestUser, seed_up_worker};

#[tokio::test]
async fn test_register_server_and_reject_duplicate_address() {
    let app = CoordinatorApp::new();
    let admin = TestUser::new("admin");

    let resp = app
        .request(
            "POST",
            "/api/servers",
            Some(json!({ "name": "edge-1", "address": "10.0.0.1:8081" })),
            Some(&admin),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.data()["address"], "10.0.0.1:8081");
    assert_eq!(resp.data()["status"], "DOWN");

    let resp = app
        .request(
            "POST",
            "/api/servers",
            Some(json!({ "name": "edge-1b", "address": "10.0.0.1:8081" })),
            Some(&admin),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
    assert_eq!(resp.body["error"], "CONFLICT");

    let resp = app.request("GET", "/api/servers", None, Some(&admin)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data().as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_session_without_capacity_is_unavailable() {
    let app = CoordinatorApp::new();
    let user = TestUser::new("alice");

    // Registered but never polled: still DOWN.
    app.request(
        "POST",
        "/api/servers",
        Some(json!({ "name": "edge-1", "address": "10.0.0.1:8081" })),
        Some(&user),
    )
    .await;

    let resp = app
        .request("POST", "/api/uploads/sessions", Some(json!({})), Some(&user))
        .await;
    assert_eq!(resp.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.body["error"], "NO_CAPACITY");
}

#[tokio::test]
async fn test_session_is_placed_on_least_loaded_worker() {
    let app = CoordinatorApp::new();
    let alice = TestUser::new("alice");

    seed_up_worker(&app.workers, "10.0.0.1:8081", 90.0, 80.0, 50.0).await;
    let quiet = seed_up_worker(&app.workers, "10.0.0.2:8081", 10.0, 20.0, 30.0).await;

    let resp = app
        .request(
            "POST",
            "/api/uploads/sessions",
            Some(json!({ "fileName": "clip.mp4", "fileType": "video/mp4", "fileSize": 1024 })),
            Some(&alice),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["serverAddress"], "10.0.0.2:8081");

    let session_id = resp.data()["sessionId"].as_str().unwrap().to_string();
    assert_eq!(
        resp.data()["destinationUrl"],
        format!("http://10.0.0.2:8081/api/uploads/{session_id}")
    );

    let node = app.workers.find_by_id(quiet.id).await.unwrap().unwrap();
    assert_eq!(node.current_load, 1);

    let path = format!("/api/uploads/sessions/{session_id}");
    let resp = app.request("GET", &path, None, Some(&alice)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["status"], "UPLOADING");

    let resp = app
        .request("GET", &path, None, Some(&TestUser::new("mallory")))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.request("GET", &path, None, None).await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_negative_file_size_is_rejected() {
    let app = CoordinatorApp::new();
    seed_up_worker(&app.workers, "10.0.0.1:8081", 10.0, 10.0, 10.0).await;

    let resp = app
        .request(
            "POST",
            "/api/uploads/sessions",
            Some(json!({ "fileSize": -5 })),
            Some(&TestUser::new("alice")),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_assign_returns_pick_without_counting_load() {
    let app = CoordinatorApp::new();
    let node = seed_up_worker(&app.workers, "10.0.0.3:8081", 5.0, 5.0, 5.0).await;

    let resp = app.request("GET", "/api/servers/assign", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["address"], "10.0.0.3:8081");

    let node = app.workers.find_by_id(node.id).await.unwrap().unwrap();
    assert_eq!(node.current_load, 0);
}

async fn seed_video(app: &CoordinatorApp, owner: &TestUser, locations: &[&str]) -> VideoId {
    let id = VideoId::new();
    app.videos
        .create(&CreateVideo {
            id,
            user_id: owner.id,
            username: owner.username.clone(),
            title: "clip.mp4".to_string(),
            duration: 12.0,
            server_location: locations[0].to_string(),
            privacy: Privacy::Public,
        })
        .await
        .unwrap();
    for (i, loc) in locations.iter().enumerate().skip(1) {
        let rung = ["240", "360", "480"][i % 3];
        app.videos.add_rendition(id, rung, loc).await.unwrap();
    }
    id
}

#[tokio::test]
async fn test_delete_video_fans_out_to_distinct_locations() {
    let app = CoordinatorApp::new();
    let alice = TestUser::new("alice");
    let id = seed_video(&app, &alice, &["10.0.0.1:8081", "10.0.0.2:8081", "10.0.0.1:8081"]).await;
    let path = format!("/api/videos/{id}");

    let resp = app
        .request("DELETE", &path, None, Some(&TestUser::new("bob")))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);
    assert!(app.fanout.calls().is_empty());

    let resp = app.request("DELETE", &path, None, Some(&alice)).await;
    assert_eq!(resp.status, StatusCode::OK);

    let mut locations: Vec<String> = app.fanout.calls().into_iter().map(|c| c.0).collect();
    locations.sort();
    assert_eq!(locations, vec!["10.0.0.1:8081", "10.0.0.2:8081"]);
    assert!(app.fanout.calls().iter().all(|c| c.1 == id && c.2 == "alice"));

    let resp = app.request("GET", &path, None, Some(&alice)).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_video_reports_unreachable_location() {
    let app = CoordinatorApp::new();
    let alice = TestUser::new("alice");
    let id = seed_video(&app, &alice, &["10.0.0.1:8081", "10.0.0.2:8081"]).await;
    app.fanout.fail_for("10.0.0.2:8081");

    let resp = app
        .request("DELETE", &format!("/api/videos/{id}"), None, Some(&alice))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert!(resp.body["message"].as_str().unwrap().contains("10.0.0.2:8081"));

    // The record is gone even though one location failed.
    assert!(app.videos.find_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_video_id_is_bad_request() {
    let app = CoordinatorApp::new();
    let resp = app
        .request("GET", "/api/videos/not-a-uuid", None, Some(&TestUser::new("alice")))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_livestream_key_lifecycle() {
    let app = CoordinatorApp::new();
    let alice = TestUser::new("alice");

    let resp = app.request("GET", "/api/livestream", None, Some(&alice)).await;
    assert_eq!(resp.status, StatusCode::OK);
    let first_key = resp.data()["streamKey"].as_str().unwrap().to_string();
    assert!(!first_key.is_empty());
    assert_eq!(resp.data()["isLive"], false);

    // Same key on the second call.
    let resp = app.request("GET", "/api/livestream", None, Some(&alice)).await;
    assert_eq!(resp.data()["streamKey"], first_key.as_str());

    let resp = app
        .request("POST", "/api/livestream/reset-key", None, Some(&alice))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_ne!(resp.data()["streamKey"], first_key.as_str());

    let resp = app
        .request(
            "POST",
            "/api/livestream/setup",
            Some(json!({ "title": "Friday night", "description": "speedruns" })),
            Some(&alice),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["title"], "Friday night");

    let resp = app
        .request("GET", "/api/livestream/status/alice", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["isLive"], false);
}

#[tokio::test]
async fn test_channel_view_for_unknown_and_offline_users() {
    let app = CoordinatorApp::new();

    let resp = app
        .request("GET", "/api/livestream/user/ghost", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["isLive"], false);
    assert_eq!(resp.data()["message"], "User not found");

    app.request("GET", "/api/livestream", None, Some(&TestUser::new("alice")))
        .await;
    let resp = app
        .request("GET", "/api/livestream/user/alice", None, None)
        .await;
    assert_eq!(resp.data()["message"], "User is not currently streaming");
}

#[tokio::test]
async fn test_stream_info_uses_balancer_when_offline() {
    let app = CoordinatorApp::new();
    let alice = TestUser::new("alice");
    seed_up_worker(&app.workers, "10.0.0.4:8081", 1.0, 1.0, 1.0).await;

    let resp = app
        .request("GET", "/api/livestream/stream-info", None, Some(&alice))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["serverAddress"], "10.0.0.4:8081");
    assert_eq!(resp.data()["ingestUrl"], "rtmp://10.0.0.4:1935/live");

    let key = resp.data()["streamKey"].as_str().unwrap();
    assert_eq!(
        resp.data()["playbackUrl"],
        format!("http://10.0.0.4:8081/live/{key}.flv")
    );
}

#[tokio::test]
async fn test_recordings_limit_must_be_positive() {
    let app = CoordinatorApp::new();

    let resp = app
        .request("GET", "/api/livestream/user/alice/recordings?limit=0", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .request("GET", "/api/livestream/user/alice/recordings", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data().as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_health() {
    let app = CoordinatorApp::new();
    let resp = app.request("GET", "/api/health", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["role"], "coordinator");
}
