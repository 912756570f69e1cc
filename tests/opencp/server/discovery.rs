#[path = "../support/app.rs"]
mod support;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};

use opencp::opencp::backend::Backends;
use opencp::opencp::config::{ApiResourceEntry, ShimConfig};
use opencp::opencp::server::{build_metrics_router, build_router, AppState};

use support::{request, send, send_raw, test_app};

#[tokio::test]
async fn version_reports_kubernetes_compatibility() {
    let (app, _) = test_app(false);
    let (status, body) = send(&app, request(Method::GET, "/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["major"], "1");
    assert_eq!(body["minor"], "24");
    assert_eq!(body["gitVersion"], "v1.24.0");
}

#[tokio::test]
async fn core_api_advertises_listen_address_by_default() {
    let (app, _) = test_app(false);
    let (_, body) = send(&app, request(Method::GET, "/api")).await;
    assert_eq!(body["kind"], "APIVersions");
    assert_eq!(body["versions"][0], "v1");
    assert_eq!(body["serverAddressByClientCIDRs"][0]["clientCIDR"], "0.0.0.0/0");
    assert_eq!(
        body["serverAddressByClientCIDRs"][0]["serverAddress"],
        "0.0.0.0:4000"
    );

    let mut config = ShimConfig::default();
    config.auth.enabled = false;
    config.server.advertise_address = Some("10.1.2.3:443".to_string());
    let app = build_router(AppState::new(config, Backends::in_memory(Vec::new())));
    let (_, body) = send(&app, request(Method::GET, "/api")).await;
    assert_eq!(
        body["serverAddressByClientCIDRs"][0]["serverAddress"],
        "10.1.2.3:443"
    );
}

#[tokio::test]
async fn core_v1_lists_namespaces() {
    let (app, _) = test_app(false);
    let (_, body) = send(&app, request(Method::GET, "/api/v1")).await;
    assert_eq!(body["groupVersion"], "v1");
    let names: Vec<&str> = body["resources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|resource| resource["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["namespaces", "namespaces/status"]);
    assert_eq!(body["resources"][0]["shortNames"][0], "ns");
}

#[tokio::test]
async fn opencp_group_discovery() {
    let (app, _) = test_app(false);
    let (_, groups) = send(&app, request(Method::GET, "/apis")).await;
    assert_eq!(groups["kind"], "APIGroupList");
    assert_eq!(groups["groups"][0]["name"], "opencp.io");
    assert_eq!(
        groups["groups"][0]["preferredVersion"]["groupVersion"],
        "opencp.io/v1alpha1"
    );

    let (_, group) = send(&app, request(Method::GET, "/apis/opencp.io")).await;
    assert_eq!(group["kind"], "APIGroup");

    let (_, resources) = send(&app, request(Method::GET, "/apis/opencp.io/v1alpha1")).await;
    assert_eq!(resources["groupVersion"], "opencp.io/v1alpha1");
    assert_eq!(resources["resources"].as_array().unwrap().len(), 9);
}

#[tokio::test]
async fn configured_api_resources_replace_the_registry() {
    let mut config = ShimConfig::default();
    config.auth.enabled = false;
    config.api_resources = vec![ApiResourceEntry {
        name: "virtualmachines".to_string(),
        singular_name: "virtualmachine".to_string(),
        kind: "VirtualMachine".to_string(),
        namespaced: true,
        verbs: vec!["get".to_string(), "list".to_string()],
        short_names: vec!["vm".to_string()],
        version: "v1alpha1".to_string(),
    }];
    let app = build_router(AppState::new(config, Backends::in_memory(Vec::new())));
    let (_, resources) = send(&app, request(Method::GET, "/apis/opencp.io/v1alpha1")).await;
    let listed = resources["resources"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["shortNames"][0], "vm");
}

#[tokio::test]
async fn events_are_always_empty() {
    let (app, _) = test_app(false);
    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/namespaces/dev/events"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "EventList");
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn metrics_listener_serves_prometheus_and_health() {
    let (app, state) = test_app(false);
    send(&app, request(Method::GET, "/version")).await;

    let metrics = build_metrics_router(state);
    let (status, headers, body) = send_raw(
        &metrics,
        Request::get("/metrics").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("opencp_http_requests_total"));

    let (status, health) = send(
        &metrics,
        Request::get("/healthz").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ready");
}
