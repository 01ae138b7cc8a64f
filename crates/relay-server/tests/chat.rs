//! End-to-end tests: HTTP router in front of a wiremock Ollama.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use relay_config::{CorsPolicy, Profile, RelayConfig};
use relay_server::dto::ChatResponse;
use relay_server::{router, AppState};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(config: RelayConfig) -> Router {
    router(Arc::new(AppState::new(config).expect("state builds")))
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn post_chat(app: Router, body: &str) -> (StatusCode, ChatResponse) {
    let res = app.oneshot(chat_request(body)).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn upstream(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn hello_is_aggregated_into_one_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({"model": "gemma3:1b", "prompt": "hello"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("{\"response\":\"Hi\"}\n{\"response\":\" there\"}\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = post_chat(app(RelayConfig::default().with_upstream(server.uri())), r#"{"message": "hello"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.response, "Hi there");
}

#[tokio::test]
async fn empty_stream_returns_sentinel() {
    let server = upstream(ResponseTemplate::new(200)).await;

    let (status, body) = post_chat(app(RelayConfig::default().with_upstream(server.uri())), r#"{"message": ""}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.response, "No response from model.");
}

#[tokio::test]
async fn missing_message_is_treated_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({"model": "gemma3:1b", "prompt": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\":\"ok\"}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let (_, body) = post_chat(app(RelayConfig::default().with_upstream(server.uri())), "{}").await;
    assert_eq!(body.response, "ok");
}

#[tokio::test]
async fn null_message_is_treated_as_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({"model": "gemma3:1b", "prompt": ""})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\":\"ok\"}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) =
        post_chat(app(RelayConfig::default().with_upstream(server.uri())), r#"{"message": null}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.response, "ok");
}

#[tokio::test]
async fn upstream_500_is_reported_in_a_200_body() {
    let server = upstream(ResponseTemplate::new(500).set_body_string("internal failure")).await;

    let (status, body) = post_chat(app(RelayConfig::default().with_upstream(server.uri())), r#"{"message": "hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.response, "Error: upstream returned HTTP 500: internal failure");
}

#[tokio::test]
async fn refused_connection_is_reported_in_a_200_body() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = RelayConfig::default().with_upstream(format!("http://127.0.0.1:{port}"));

    let (status, body) = post_chat(app(config), r#"{"message": "hi"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.response.starts_with("Error: upstream unreachable: "), "got: {}", body.response);
}

#[tokio::test]
async fn local_profile_uses_its_own_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_json(serde_json::json!({"model": "qwen2.5-coder:7b", "prompt": "fn main"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"response\":\"{}\"}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let config = RelayConfig::for_profile(Profile::Local).with_upstream(server.uri());
    let (_, body) = post_chat(app(config), r#"{"message": "fn main"}"#).await;
    assert_eq!(body.response, "{}");
}

#[tokio::test]
async fn open_profile_sends_cors_headers() {
    let res = app(RelayConfig::for_profile(Profile::Open))
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
}

#[tokio::test]
async fn disabled_cors_sends_no_headers() {
    let mut config = RelayConfig::for_profile(Profile::Open);
    config.cors = CorsPolicy::Disabled;

    let res = app(config)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

#[tokio::test]
async fn welcome_page_follows_profile() {
    let res = app(RelayConfig::for_profile(Profile::Open))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Ollama Chat API is running.");

    let res = app(RelayConfig::for_profile(Profile::Local))
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert!(std::str::from_utf8(&bytes).unwrap().contains("fetch('/chat'"));
}

#[tokio::test]
async fn health_is_ok() {
    let res = app(RelayConfig::default())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
