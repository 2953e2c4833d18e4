#![allow(dead_code)]

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use testimony_api::config::ServerConfig;
use testimony_api::router::build_app_router;
use testimony_api::state::AppState;
use testimony_core::clip_time::ClipTimeThresholds;
use testimony_db::models::clip::ClipDocument;
use testimony_db::ClipStore;

/// Soft long-duration limit the test app runs with (15 minutes).
pub const TEST_SUSPICIOUS_LONG_SECS: f64 = 900.0;

/// Build a test `ServerConfig` pointing at `store_path`, with the soft
/// long-duration check switched on.
pub fn test_config(store_path: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3001".to_string()],
        request_timeout_secs: 30,
        clip_store_path: store_path,
        thresholds: ClipTimeThresholds {
            suspicious_long_duration_seconds: TEST_SUSPICIOUS_LONG_SECS,
            ..ClipTimeThresholds::default()
        },
    }
}

/// A running app over a temporary clip store.
pub struct TestApp {
    pub router: Router,
    pub store_path: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    /// Clone of the router for one `oneshot` request.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Reload the store file from disk.
    pub async fn reload_store(&self) -> ClipStore {
        ClipStore::open(&self.store_path).await.unwrap()
    }
}

/// Write `clips` (a JSON array of documents) to a temp store and build the
/// full application router over it, with the same middleware stack the
/// binary uses.
pub async fn build_test_app(clips: Value) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store_path = dir.path().join("clips.json");
    let documents: Vec<ClipDocument> = serde_json::from_value(clips).unwrap();
    let store = ClipStore::from_documents(&store_path, documents).unwrap();
    store.save().await.unwrap();

    let config = test_config(store_path.clone());
    let state = AppState::new(store, config.clone());
    TestApp {
        router: build_app_router(state, &config),
        store_path,
        _dir: dir,
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send_json(app, Method::PUT, uri, body).await
}

async fn send_json(app: Router, method: Method, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
