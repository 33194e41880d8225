//! Worker API integration tests: chunked upload and merge, delete task
//! intake and streaming-server webhooks.

use axum::http::StatusCode;
use serde_json::json;

use mediahub_core::types::VideoId;
use mediahub_database::store::{
    LivestreamKeyStore, LivestreamStore, UploadSessionStore, VideoStore,
};
use mediahub_entity::livestream::LivestreamKey;
use mediahub_entity::task::MediaTask;
use mediahub_entity::upload::{CreateUploadSession, UploadStatus};
use mediahub_entity::video::Resolution;

use crate::helpers::{TestUser, WORKER_ADDRESS, WorkerApp};

async fn open_session(app: &WorkerApp, user: &TestUser) -> String {
    let session = app
        .sessions
        .create(&CreateUploadSession {
            user_id: user.id,
            username: user.username.clone(),
            server_address: WORKER_ADDRESS.to_string(),
            file_name: None,
            file_type: None,
            file_size: None,
        })
        .await
        .unwrap();
    session.id.to_string()
}

fn chunk_fields(index: u32, total: u32) -> Vec<(&'static str, String)> {
    vec![
        ("fileName", "clip.mp4".to_string()),
        ("fileType", "video/mp4".to_string()),
        ("fileSize", "9".to_string()),
        ("fileDuration", "12.5".to_string()),
        ("chunkIndex", index.to_string()),
        ("totalChunks", total.to_string()),
    ]
}

#[tokio::test]
async fn test_out_of_order_chunks_merge_into_video() {
    let app = WorkerApp::new(720);
    let alice = TestUser::new("alice");
    let session_id = open_session(&app, &alice).await;

    let resp = app
        .upload_chunk(&session_id, &alice, b"ghi", &chunk_fields(2, 3))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["status"], "chunk_received");
    assert_eq!(resp.data()["chunkIndex"], 2);

    let resp = app
        .upload_chunk(&session_id, &alice, b"abc", &chunk_fields(0, 3))
        .await;
    assert_eq!(resp.data()["status"], "chunk_received");

    let resp = app
        .upload_chunk(&session_id, &alice, b"def", &chunk_fields(1, 3))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["status"], "completed");
    assert_eq!(
        resp.data()["transcodesQueued"],
        Resolution::rungs_below(720).count()
    );

    let video_id: VideoId = resp.data()["videoId"].as_str().unwrap().parse().unwrap();
    let video = app.videos.find_by_id(video_id).await.unwrap().unwrap();
    assert_eq!(video.username, "alice");
    assert_eq!(video.server_locations, vec![WORKER_ADDRESS.to_string()]);
    assert!(video.thumbnail.is_some());

    let raw = app.layout.raw_path("alice", video_id, "clip.mp4").unwrap();
    assert_eq!(tokio::fs::read(&raw).await.unwrap(), b"abcdefghi");

    let session = app
        .sessions
        .find_by_id(session_id.parse().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status, UploadStatus::Completed);
    assert_eq!(session.video_id, Some(video_id));

    let tasks = app.drain_tasks().await;
    let mut heights: Vec<u32> = tasks
        .iter()
        .map(|envelope| match &envelope.task {
            MediaTask::Transcode {
                video_id: id,
                resolution,
                ..
            } => {
                assert_eq!(*id, video_id);
                resolution.height()
            }
            other => panic!("unexpected task {other:?}"),
        })
        .collect();
    heights.sort_unstable();
    assert_eq!(heights, vec![240, 360, 480]);
}

#[tokio::test]
async fn test_chunk_after_merge_reports_existing_video() {
    let app = WorkerApp::new(240);
    let alice = TestUser::new("alice");
    let session_id = open_session(&app, &alice).await;

    let resp = app
        .upload_chunk(&session_id, &alice, b"only", &chunk_fields(0, 1))
        .await;
    assert_eq!(resp.data()["status"], "completed");
    assert_eq!(resp.data()["transcodesQueued"], 0);
    let video_id = resp.data()["videoId"].clone();

    let resp = app
        .upload_chunk(&session_id, &alice, b"only", &chunk_fields(0, 1))
        .await;
    assert_eq!(resp.data()["status"], "completed");
    assert_eq!(resp.data()["videoId"], video_id);
    assert!(app.drain_tasks().await.is_empty());
}

#[tokio::test]
async fn test_chunk_rejections() {
    let app = WorkerApp::new(480);
    let alice = TestUser::new("alice");
    let session_id = open_session(&app, &alice).await;

    let resp = app
        .upload_chunk(&session_id, &alice, b"x", &chunk_fields(3, 3))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);

    let resp = app
        .upload_chunk(&session_id, &TestUser::new("mallory"), b"x", &chunk_fields(0, 3))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let missing = uuid_like_session();
    let resp = app
        .upload_chunk(&missing, &alice, b"x", &chunk_fields(0, 3))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

fn uuid_like_session() -> String {
    "00000000-0000-4000-8000-000000000000".to_string()
}

#[tokio::test]
async fn test_delete_task_is_enqueued() {
    let app = WorkerApp::new(720);
    let video_id = VideoId::new();

    let resp = app
        .request(
            "POST",
            "/api/tasks/delete",
            Some(json!({ "videoId": video_id.to_string(), "username": "alice" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::ACCEPTED);
    assert_eq!(resp.data()["action"], "DELETE");

    let tasks = app.drain_tasks().await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].attempt, 1);
    match &tasks[0].task {
        MediaTask::Delete {
            video_id: id,
            username,
        } => {
            assert_eq!(*id, video_id);
            assert_eq!(username, "alice");
        }
        other => panic!("unexpected task {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_task_requires_video_id() {
    let app = WorkerApp::new(720);
    let resp = app
        .request(
            "POST",
            "/api/tasks/delete",
            Some(json!({ "username": "alice" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(app.drain_tasks().await.is_empty());
}

#[tokio::test]
async fn test_publish_hook_rejects_unknown_key() {
    let app = WorkerApp::new(720);

    let resp = app
        .request(
            "POST",
            "/api/livestreams/hooks/publish",
            Some(json!({ "action": "on_publish", "app": "live", "stream": "nope" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["code"], 1);

    let resp = app
        .request("POST", "/api/livestreams/hooks/publish", Some(json!({})), None)
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["code"], 1);
    assert_eq!(resp.body["msg"], "No stream key provided");
}

#[tokio::test]
async fn test_publish_then_unpublish_flips_live_state() {
    let app = WorkerApp::new(720);
    let alice = TestUser::new("alice");
    let key = app
        .keys
        .insert_if_absent(&LivestreamKey::new(alice.id, "alice"))
        .await
        .unwrap();

    let resp = app
        .request(
            "POST",
            "/api/livestreams/hooks/publish",
            Some(json!({ "action": "on_publish", "app": "live", "stream": key.stream_key })),
            None,
        )
        .await;
    assert_eq!(resp.body["code"], 0);

    let live = app.keys.find_by_username("alice").await.unwrap().unwrap();
    assert!(live.is_live);
    let livestream_id = live.current_livestream_id.unwrap();
    let stream = app.streams.find_by_id(livestream_id).await.unwrap().unwrap();
    assert_eq!(stream.server_location, WORKER_ADDRESS);
    assert_eq!(stream.title, "Live Stream");

    let resp = app
        .request(
            "POST",
            "/api/livestreams/hooks/unpublish",
            Some(json!({ "action": "on_unpublish", "stream": key.stream_key })),
            None,
        )
        .await;
    assert_eq!(resp.body["code"], 0);

    let offline = app.keys.find_by_username("alice").await.unwrap().unwrap();
    assert!(!offline.is_live);
    assert!(offline.current_livestream_id.is_none());
    let stream = app.streams.find_by_id(livestream_id).await.unwrap().unwrap();
    assert!(stream.ended_at.is_some());
}

#[tokio::test]
async fn test_dvr_hook_always_accepts() {
    let app = WorkerApp::new(720);
    let resp = app
        .request(
            "POST",
            "/api/livestreams/hooks/dvr",
            Some(json!({ "stream": "unknown", "file": "/app/objs/nginx/html/live/x.flv" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["code"], 0);
}

#[tokio::test]
async fn test_worker_health() {
    let app = WorkerApp::new(720);
    let resp = app.request("GET", "/api/health", None, None).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.data()["role"], "worker");
}
