//! HTTP router integration tests

mod helpers;

use avatalk_chat::providers::{ProviderRegistry, CONNECTION_APOLOGY};
use avatalk_chat::{build_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use helpers::{Behavior, MockChat, TestRig};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_for(rig: &TestRig) -> axum::Router {
    let state = AppState::new(rig.controller(), rig.providers.clone(), rig.chat.clone());
    build_router(state)
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let rig = TestRig::new();
    let (status, body) = send(app_for(&rig), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "avatalk-chat");
    assert!(body.get("last_error").is_none());
}

#[tokio::test]
async fn test_chat_happy_path() {
    let rig = TestRig::new().with_fixtures();
    let (status, body) = send(app_for(&rig), post_json("/chat", json!({}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], false);
    assert_eq!(
        body["states"],
        json!(["IDLE", "TRANSCRIBING", "RESPONDING", "CLONING", "RENDERING", "DONE"])
    );

    let video = body["video_path"].as_str().unwrap();
    assert!(video.starts_with("static/videos/chat_"));
    assert_ne!(video, "static/videos/chat_response.mp4");
}

#[tokio::test]
async fn test_chat_degraded_still_returns_ok_with_sentinel() {
    let rig = TestRig::new();
    let app = app_for(&rig);

    let (status, body) = send(app.clone(), post_json("/chat", json!({"gpu_choice": "GPU0"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["video_path"], "static/videos/chat_response.mp4");
    assert_eq!(body["failure"]["kind"], "MissingInput");

    // The degraded run is reported by /health
    let (_, health) = send(app, get("/health")).await;
    assert!(health["last_error"].as_str().unwrap().contains("transcription"));
}

#[tokio::test]
async fn test_chat_wrongly_typed_parameter_uses_default() {
    let rig = TestRig::new().with_fixtures();
    let (status, body) = send(
        app_for(&rig),
        post_json("/chat", json!({"gpu_choice": 1, "audio_extractor": "hubert"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["degraded"], false);

    let render_job = rig.renderer.last_job().unwrap();
    assert_eq!(render_job.device, "GPU0");
    assert_eq!(render_job.feature_extractor, "hubert");
}

#[tokio::test]
async fn test_llm_query_returns_reply() {
    let rig = TestRig::new();
    let (status, body) = send(
        app_for(&rig),
        post_json("/llm/query", json!({"text": "你好", "api_choice": "openai"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "你好，很高兴见到你！");
    assert_eq!(rig.chat.backends_seen(), vec!["openai".to_string()]);
}

#[tokio::test]
async fn test_llm_query_unconfigured_returns_message() {
    let rig = TestRig::new().with_providers(ProviderRegistry::builtin());
    let (status, body) = send(app_for(&rig), post_json("/llm/query", json!({"text": "hi"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["reply"].as_str().unwrap().contains("ZHIPU_API_KEY"));
    assert_eq!(rig.chat.calls(), 0);
}

#[tokio::test]
async fn test_llm_query_connection_failure_returns_apology() {
    let rig = TestRig::new().with_chat(MockChat::new("").with_behavior(Behavior::Fail));
    let (_, body) = send(app_for(&rig), post_json("/llm/query", json!({"text": "hi"}))).await;

    assert_eq!(body["reply"], CONNECTION_APOLOGY);
}

#[tokio::test]
async fn test_llm_query_rejects_empty_text() {
    let rig = TestRig::new();
    let (status, body) = send(app_for(&rig), post_json("/llm/query", json!({"text": "  "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_providers_masks_keys() {
    let rig = TestRig::new();
    let (status, body) = send(app_for(&rig), get("/providers")).await;

    assert_eq!(status, StatusCode::OK);
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 3);

    let raw = body.to_string();
    assert!(!raw.contains("test-secret"), "full keys must never be returned");
    for provider in providers {
        assert_eq!(provider["configured"], true);
        assert!(provider["masked_key"].as_str().unwrap().contains('…'));
    }
}

#[tokio::test]
async fn test_providers_reports_unconfigured() {
    let rig = TestRig::new().with_providers(ProviderRegistry::builtin());
    let (_, body) = send(app_for(&rig), get("/providers")).await;

    for provider in body["providers"].as_array().unwrap() {
        assert_eq!(provider["configured"], false);
        assert_eq!(provider["key_source"], "default");
        assert!(provider.get("masked_key").is_none());
    }
}
