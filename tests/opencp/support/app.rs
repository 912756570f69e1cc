use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use opencp::opencp::backend::Backends;
use opencp::opencp::config::ShimConfig;
use opencp::opencp::server::{build_router, AppState};

pub const TOKEN: &str = "test-token";
pub const KUBECTL_AGENT: &str = "kubectl/v1.29.0 (linux/amd64) kubernetes/abcdef";

/// Router over in-memory backends. With `auth` set, only [`TOKEN`] is accepted.
pub fn test_app(auth: bool) -> (Router, AppState) {
    let mut config = ShimConfig::default();
    config.auth.enabled = auth;
    config.auth.tokens = vec![TOKEN.to_string()];
    let backends = Backends::in_memory(config.auth.tokens.clone());
    let state = AppState::new(config, backends);
    (build_router(state.clone()), state)
}

pub fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, KUBECTL_AGENT)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .expect("request")
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::USER_AGENT, KUBECTL_AGENT)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, headers, body.to_vec())
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send_raw(app, request).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("json body")
    };
    (status, value)
}
