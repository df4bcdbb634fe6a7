//! End-to-end tests of the HTTP surface with a mocked upstream

use fiesta::catalog::Catalog;
use fiesta::config::{DispatchConfig, UpstreamConfig};
use fiesta::llm::{DispatchResponse, Dispatcher, OpenRouterProvider};
use fiesta::server::{self, AppState, ErrorResponse, HealthResponse, ModelsResponse};
use pretty_assertions::assert_eq;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use wiremock::matchers::{any, body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Start the app on an ephemeral port and return its base URL
async fn spawn_app(upstream: &MockServer, api_key: &str) -> String {
    spawn_app_with_origins(upstream, api_key, &[]).await
}

async fn spawn_app_with_origins(upstream: &MockServer, api_key: &str, origins: &[&str]) -> String {
    let config = UpstreamConfig {
        endpoint: upstream.uri(),
        api_key: api_key.to_string(),
        ..Default::default()
    };
    let provider = OpenRouterProvider::new(&config).unwrap();
    let dispatcher = Dispatcher::new(Arc::new(provider), &DispatchConfig::default());
    let origins: Vec<String> = origins.iter().map(|o| o.to_string()).collect();
    let app = server::router(AppState::new(dispatcher, Catalog::default()), &origins);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn mount_no_calls(upstream: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(upstream)
        .await;
}

async fn post_chat(base: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_chat_mixed_results() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": "m1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "hello from m1"}}]
        })))
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"model": "m2"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("rate limited"))
        .mount(&upstream)
        .await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = post_chat(
        &base,
        json!({"models": ["m1", "m2"], "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"results": [
            {"model": "m1", "content": "hello from m1"},
            {"model": "m2", "content": "", "error": "rate limited"}
        ]})
    );
}

#[tokio::test]
async fn test_chat_all_failed_is_still_ok() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&upstream)
        .await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = post_chat(
        &base,
        json!({"models": ["a", "b"], "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: DispatchResponse = response.json().await.unwrap();
    assert_eq!(body.results.len(), 2);
    assert!(body
        .results
        .iter()
        .all(|r| r.error.as_deref() == Some("overloaded")));
}

#[tokio::test]
async fn test_chat_empty_models() {
    let upstream = MockServer::start().await;
    mount_no_calls(&upstream).await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = post_chat(
        &base,
        json!({"models": [], "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "models[] required");
}

#[tokio::test]
async fn test_chat_absent_messages() {
    let upstream = MockServer::start().await;
    mount_no_calls(&upstream).await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = post_chat(&base, json!({"models": ["m1"]})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "messages[] required");
}

#[tokio::test]
async fn test_chat_null_models_and_messages() {
    let upstream = MockServer::start().await;
    mount_no_calls(&upstream).await;
    let base = spawn_app(&upstream, "test-key").await;

    let null_models = post_chat(
        &base,
        json!({"models": null, "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;
    assert_eq!(null_models.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = null_models.json().await.unwrap();
    assert_eq!(body.error, "models[] required");

    let null_messages = post_chat(&base, json!({"models": ["m1"], "messages": null})).await;
    assert_eq!(null_messages.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = null_messages.json().await.unwrap();
    assert_eq!(body.error, "messages[] required");
}

#[tokio::test]
async fn test_chat_malformed_body() {
    let upstream = MockServer::start().await;
    mount_no_calls(&upstream).await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response.json().await.unwrap();
    assert!(!body.error.is_empty());
}

#[tokio::test]
async fn test_chat_unknown_role() {
    let upstream = MockServer::start().await;
    mount_no_calls(&upstream).await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = post_chat(
        &base,
        json!({"models": ["m1"], "messages": [{"role": "robot", "content": "hi"}]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_missing_credential() {
    let upstream = MockServer::start().await;
    mount_no_calls(&upstream).await;
    let base = spawn_app(&upstream, "").await;

    let response = post_chat(
        &base,
        json!({"models": ["m1"], "messages": [{"role": "user", "content": "hi"}]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorResponse = response.json().await.unwrap();
    assert_eq!(body.error, "upstream API key not configured");
}

#[tokio::test]
async fn test_models_endpoint() {
    let upstream = MockServer::start().await;
    let base = spawn_app(&upstream, "test-key").await;

    let body: ModelsResponse = reqwest::get(format!("{}/api/models", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body.models, Catalog::default().models().to_vec());
    assert_eq!(body.default_selection, Catalog::default().default_selection());
}

#[tokio::test]
async fn test_health_reports_credential() {
    let upstream = MockServer::start().await;
    let configured = spawn_app(&upstream, "test-key").await;
    let missing = spawn_app(&upstream, "").await;

    let ok: HealthResponse = reqwest::get(format!("{}/api/health", configured))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let degraded: HealthResponse = reqwest::get(format!("{}/api/health", missing))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(ok.status, "ok");
    assert!(ok.upstream_configured);
    assert!(!degraded.upstream_configured);
}

async fn preflight(base: &str, origin: &str) -> reqwest::Response {
    reqwest::Client::new()
        .request(Method::OPTIONS, format!("{}/api/chat", base))
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_cors_allows_any_origin_when_unconfigured() {
    let upstream = MockServer::start().await;
    let base = spawn_app(&upstream, "test-key").await;

    let response = preflight(&base, "https://anywhere.example").await;

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_allow_list() {
    let upstream = MockServer::start().await;
    let base = spawn_app_with_origins(&upstream, "test-key", &["https://fiesta.example"]).await;

    let allowed = preflight(&base, "https://fiesta.example").await;
    let denied = preflight(&base, "https://evil.example").await;

    assert_eq!(
        allowed.headers().get("access-control-allow-origin").unwrap(),
        "https://fiesta.example"
    );
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}
