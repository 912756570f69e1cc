#[path = "../support/app.rs"]
mod support;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};

use opencp::opencp::backend::in_memory::InMemoryBackend;
use opencp::opencp::backend::{BackendError, Backends, ResourceBackend};
use opencp::opencp::config::ShimConfig;
use opencp::opencp::resources::kinds::VirtualMachineKind;
use opencp::opencp::server::{build_router, AppState};

use support::{json_request, request, send, send_raw, test_app, KUBECTL_AGENT, TOKEN};

const VMS: &str = "/apis/opencp.io/v1alpha1/namespaces/dev/virtualmachines";

fn vm_body(name: &str) -> Value {
    json!({
        "apiVersion": "opencp.io/v1alpha1",
        "kind": "VirtualMachine",
        "metadata": { "name": name },
        "spec": {
            "size": "g3.small",
            "image": "ubuntu-22.04",
            "auth": { "user": "ops", "sshKey": "default" }
        }
    })
}

#[tokio::test]
async fn virtual_machine_lifecycle() {
    let (app, _) = test_app(false);

    let (status, created) = send(&app, json_request(Method::POST, VMS, vm_body("web"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["kind"], "VirtualMachine");
    assert_eq!(created["apiVersion"], "opencp.io/v1alpha1");
    assert_eq!(created["metadata"]["namespace"], "dev");
    assert_eq!(created["spec"]["size"], "g3.small");
    let uid = created["metadata"]["uid"].as_str().unwrap().to_string();
    assert!(!uid.is_empty());

    let (status, fetched) = send(&app, request(Method::GET, &format!("{VMS}/web"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["metadata"]["uid"], uid.as_str());
    assert!(fetched["spec"].get("region").is_none());

    let (status, list) = send(&app, request(Method::GET, VMS)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["kind"], "VirtualMachineList");
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let (_, all) = send(
        &app,
        request(Method::GET, "/apis/opencp.io/v1alpha1/virtualmachines"),
    )
    .await;
    assert_eq!(all["items"].as_array().unwrap().len(), 1);

    let (_, other) = send(
        &app,
        request(
            Method::GET,
            "/apis/opencp.io/v1alpha1/namespaces/prod/virtualmachines",
        ),
    )
    .await;
    assert!(other["items"].as_array().unwrap().is_empty());

    let (status, deleted) = send(&app, request(Method::DELETE, &format!("{VMS}/web"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["kind"], "Status");
    assert_eq!(deleted["status"], "Success");
    assert_eq!(deleted["details"]["name"], "web");
    assert_eq!(deleted["details"]["group"], "opencp.io");
    assert_eq!(deleted["details"]["kind"], "virtualmachines");
    assert_eq!(deleted["details"]["uid"], uid.as_str());

    let (status, missing) = send(&app, request(Method::GET, &format!("{VMS}/web"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["reason"], "NotFound");
    assert_eq!(
        missing["message"],
        "virtualmachines.opencp.io \"web\" not found"
    );
}

#[tokio::test]
async fn deleting_a_missing_object_is_not_found() {
    let (app, _) = test_app(false);
    let (status, body) = send(&app, request(Method::DELETE, &format!("{VMS}/ghost"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn create_rejects_conflicting_namespace_and_bad_bodies() {
    let (app, _) = test_app(false);

    let mut body = vm_body("web");
    body["metadata"]["namespace"] = json!("prod");
    let (status, rejected) = send(&app, json_request(Method::POST, VMS, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected["reason"], "BadRequest");

    let malformed = Request::builder()
        .method(Method::POST)
        .uri(VMS)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn yaml_bodies_and_yaml_output() {
    let (app, _) = test_app(false);
    let manifest = "apiVersion: opencp.io/v1alpha1\nkind: VirtualMachine\nmetadata:\n  name: db\nspec:\n  size: g3.large\n";
    let create = Request::builder()
        .method(Method::POST)
        .uri(VMS)
        .header(header::CONTENT_TYPE, "application/yaml")
        .body(Body::from(manifest))
        .unwrap();
    let (status, created) = send(&app, create).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["spec"]["size"], "g3.large");

    let (status, headers, body) =
        send_raw(&app, request(Method::GET, &format!("{VMS}/db?format=yaml"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/yaml");
    let value: Value = serde_yaml::from_slice(&body).unwrap();
    assert_eq!(value["metadata"]["name"], "db");
}

#[tokio::test]
async fn field_selectors_filter_lists() {
    let (app, _) = test_app(false);
    for name in ["web", "db"] {
        send(&app, json_request(Method::POST, VMS, vm_body(name))).await;
    }

    let (status, list) = send(
        &app,
        request(
            Method::GET,
            "/apis/opencp.io/v1alpha1/virtualmachines?fieldSelector=metadata.name%3Ddb",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["metadata"]["name"], "db");

    let (_, by_namespace) = send(
        &app,
        request(
            Method::GET,
            "/apis/opencp.io/v1alpha1/virtualmachines?fieldSelector=metadata.namespace%3D%3Ddev",
        ),
    )
    .await;
    assert_eq!(by_namespace["items"].as_array().unwrap().len(), 2);

    let (_, conflicting) = send(
        &app,
        request(
            Method::GET,
            &format!("{VMS}?fieldSelector=metadata.namespace%3Dprod"),
        ),
    )
    .await;
    assert!(conflicting["items"].as_array().unwrap().is_empty());

    let (status, rejected) = send(
        &app,
        request(Method::GET, &format!("{VMS}?fieldSelector=spec.size%3Dsmall")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected["code"], 400);
}

#[tokio::test]
async fn table_projection_for_kubectl_get() {
    let (app, _) = test_app(false);
    send(&app, json_request(Method::POST, VMS, vm_body("web"))).await;

    let mut get = request(Method::GET, VMS);
    get.headers_mut().insert(
        header::ACCEPT,
        "application/json;as=Table;v=v1;g=meta.k8s.io,application/json"
            .parse()
            .unwrap(),
    );
    let (status, headers, body) = send_raw(&app, get).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("as=Table"));
    let table: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(table["kind"], "Table");
    let columns: Vec<&str> = table["columnDefinitions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|column| column["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        columns,
        ["Hostname", "UID", "Size", "Public IP", "Private IP", "Status"]
    );
    assert_eq!(table["rows"][0]["cells"][0], "web");
    assert_eq!(table["rows"][0]["cells"][2], "g3.small");
}

#[tokio::test]
async fn single_object_table_has_exactly_one_row() {
    let (app, _) = test_app(false);
    for name in ["web", "db"] {
        send(&app, json_request(Method::POST, VMS, vm_body(name))).await;
    }

    let mut get = request(Method::GET, &format!("{VMS}/db"));
    get.headers_mut().insert(
        header::ACCEPT,
        "application/json;as=Table;v=v1;g=meta.k8s.io".parse().unwrap(),
    );
    let (status, _, body) = send_raw(&app, get).await;
    assert_eq!(status, StatusCode::OK);
    let table: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(table["kind"], "Table");
    let rows = table["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["cells"][0], "db");
    assert_eq!(rows[0]["object"]["metadata"]["name"], "db");
}

#[tokio::test]
async fn selecting_an_absent_name_lists_nothing_while_get_is_not_found() {
    let (app, _) = test_app(false);
    send(&app, json_request(Method::POST, VMS, vm_body("web"))).await;

    let (status, list) = send(
        &app,
        request(Method::GET, &format!("{VMS}?fieldSelector=metadata.name%3Dghost")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["kind"], "VirtualMachineList");
    assert!(list["items"].as_array().unwrap().is_empty());

    let (status, missing) = send(&app, request(Method::GET, &format!("{VMS}/ghost"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["reason"], "NotFound");
    assert_eq!(
        missing["message"],
        "virtualmachines.opencp.io \"ghost\" not found"
    );
}

#[tokio::test]
async fn cluster_scoped_kinds_are_reachable_without_namespace() {
    let (app, _) = test_app(false);
    let domain = json!({
        "apiVersion": "opencp.io/v1alpha1",
        "kind": "Domain",
        "metadata": { "name": "example.com" },
        "spec": { "records": [{ "type": "A", "name": "www", "value": "192.0.2.1", "ttl": 600 }] }
    });
    let (status, created) = send(
        &app,
        json_request(Method::POST, "/apis/opencp.io/v1alpha1/domains", domain),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["metadata"].get("namespace").is_none());

    let (status, fetched) = send(
        &app,
        request(Method::GET, "/apis/opencp.io/v1alpha1/domains/example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["spec"]["records"][0]["type"], "A");

    // The namespace segment is ignored for cluster-scoped kinds.
    let (status, _) = send(
        &app,
        request(
            Method::GET,
            "/apis/opencp.io/v1alpha1/namespaces/anything/domains/example.com",
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, deleted) = send(
        &app,
        request(Method::DELETE, "/apis/opencp.io/v1alpha1/domains/example.com"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["details"]["kind"], "domains");
}

#[tokio::test]
async fn core_namespaces() {
    let (app, _) = test_app(false);
    let (status, created) = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/namespaces",
            json!({ "apiVersion": "v1", "kind": "Namespace", "metadata": { "name": "dev" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["apiVersion"], "v1");

    let (status, fetched) = send(&app, request(Method::GET, "/api/v1/namespaces/dev")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["kind"], "Namespace");

    let (_, list) = send(&app, request(Method::GET, "/api/v1/namespaces")).await;
    assert_eq!(list["kind"], "NamespaceList");
    assert_eq!(list["items"].as_array().unwrap().len(), 1);

    let (status, missing) = send(&app, request(Method::GET, "/api/v1/namespaces/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["message"], "namespaces \"nope\" not found");

    let (status, deleted) = send(&app, request(Method::DELETE, "/api/v1/namespaces/dev")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["details"]["kind"], "namespaces");
    assert!(deleted["details"].get("group").is_none());
}

#[tokio::test]
async fn patching_kubernetes_clusters_is_not_allowed() {
    let (app, _) = test_app(false);
    let (status, body) = send(
        &app,
        json_request(
            Method::PATCH,
            "/apis/opencp.io/v1alpha1/namespaces/dev/kubernetesclusters/prod",
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["kind"], "Status");
    assert_eq!(body["reason"], "MethodNotAllowed");
}

#[tokio::test]
async fn backend_failures_surface_as_internal_errors() {
    let vms = Arc::new(InMemoryBackend::<VirtualMachineKind>::new());
    let mut backends = Backends::in_memory(Vec::new());
    let shared: Arc<dyn ResourceBackend<VirtualMachineKind>> = vms.clone();
    backends.virtual_machines = shared;
    let mut config = ShimConfig::default();
    config.auth.enabled = false;
    let app = build_router(AppState::new(config, backends));

    vms.set_failure(Some(BackendError::Unavailable("connection refused".to_string())));
    let (status, body) = send(&app, request(Method::GET, VMS)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["reason"], "InternalError");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("failed to list virtualmachines"));

    // A failure is never reported as absence.
    let (status, _) = send(&app, request(Method::GET, &format!("{VMS}/web"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn authentication_requires_kubectl_and_a_valid_token() {
    let (app, _) = test_app(true);

    let anonymous = Request::builder()
        .uri(VMS)
        .header(header::USER_AGENT, "curl/8.0")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not Authorized or not a valid client");

    let no_token = Request::builder()
        .uri(VMS)
        .header(header::USER_AGENT, KUBECTL_AGENT)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, no_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not Authorized");

    let wrong_token = Request::builder()
        .uri(VMS)
        .header(header::USER_AGENT, KUBECTL_AGENT)
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let lower_case_scheme = Request::builder()
        .uri(VMS)
        .header(header::USER_AGENT, KUBECTL_AGENT)
        .header(header::AUTHORIZATION, format!("bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, lower_case_scheme).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn every_response_carries_kubernetes_headers() {
    let (app, _) = test_app(true);
    let (_, headers, _) = send_raw(&app, Request::get(VMS).body(Body::empty()).unwrap()).await;
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache, private");
    assert!(headers.contains_key("x-kubernetes-pf-flowschema-uid"));
    assert!(headers.contains_key("x-kubernetes-pf-prioritylevel-uid"));
}
