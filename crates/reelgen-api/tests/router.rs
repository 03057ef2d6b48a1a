//! Router-level tests exercising the full middleware and handler stack.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use reelgen_api::{create_router, ApiConfig, AppState};
use reelgen_media::ExternalToolkit;
use reelgen_orchestrator::{JobOrchestrator, OrchestratorConfig, OrchestratorContext};
use reelgen_providers::{RestImageClient, RestSpeechClient, RestTextClient, RestVideoClient};
use reelgen_storage::MemoryObjectStore;
use reelgen_store::MemoryStore;

// In-memory state; the REST providers point at a dead address and must
// never be reached by the requests below.
fn test_state() -> AppState {
    let store = Arc::new(MemoryStore::new());
    let ctx = OrchestratorContext {
        config: OrchestratorConfig::default(),
        jobs: store.clone(),
        segments: store.clone(),
        credits: store,
        storage: Arc::new(MemoryObjectStore::new()),
        text: Arc::new(RestTextClient::new("http://127.0.0.1:1", "test")),
        speech: Arc::new(RestSpeechClient::new("http://127.0.0.1:1", "test")),
        image: Arc::new(RestImageClient::new("http://127.0.0.1:1", "test")),
        video: Arc::new(RestVideoClient::new("http://127.0.0.1:1", "test")),
        media: Arc::new(ExternalToolkit::from_env()),
    };
    AppState::with_orchestrator(ApiConfig::default(), JobOrchestrator::new(ctx))
}

#[tokio::test]
async fn test_webhook_for_unknown_job_is_acknowledged() {
    let app = create_router(test_state(), None);

    // The provider retries on non-2xx; a delivery naming a job we have
    // no record of must still be acknowledged, not error out.
    let req = Request::builder()
        .method("POST")
        .uri("/api/webhooks/video/no-such-job/0")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"status": "succeeded", "output": "https://p/x.mp4"}"#,
        ))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_identity_header_is_unauthorized() {
    let app = create_router(test_state(), None);

    let req = Request::builder()
        .uri("/api/credits")
        .body(Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_credit_balance_for_fresh_user_is_zero() {
    let app = create_router(test_state(), None);

    let req = Request::builder()
        .uri("/api/credits")
        .header("X-User-Id", "user1")
        .body(Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["user_id"], "user1");
    assert_eq!(body["balance"], 0);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let app = create_router(test_state(), None);

    let req = Request::builder()
        .uri("/api/jobs/no-such-job")
        .header("X-User-Id", "user1")
        .body(Body::empty())
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
