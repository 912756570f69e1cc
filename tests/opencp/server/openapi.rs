#[path = "../support/app.rs"]
mod support;

use axum::http::{header, HeaderValue, Method, StatusCode};
use prost::Message;
use serde_json::Value;
use sha2::{Digest, Sha512};

use opencp::opencp::server::openapi::proto::Document;
use opencp::opencp::server::openapi::{
    DocumentError, JSON_CONTENT_TYPE, PROTOBUF_CONTENT_TYPE,
};

use support::{request, send_raw, test_app};

const OPENAPI: &str = "/openapi/v2";

#[tokio::test]
async fn serves_json_document_with_validators() {
    let (app, _) = test_app(false);
    let (status, headers, body) = send_raw(&app, request(Method::GET, OPENAPI)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], JSON_CONTENT_TYPE);
    assert_eq!(headers[header::VARY], "Accept");
    assert!(headers.contains_key(header::LAST_MODIFIED));

    let expected_etag = format!("\"{}\"", hex::encode_upper(Sha512::digest(&body)));
    assert_eq!(headers[header::ETAG], expected_etag.as_str());

    let document: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(document["swagger"], "2.0");
    assert_eq!(document["info"]["title"], "Open Controll Plane API");
    assert!(document["paths"]
        .get("/apis/opencp.io/v1alpha1/namespaces/{namespace}/virtualmachines")
        .is_some());
    assert!(document["definitions"]
        .get("io.opencp.v1alpha1.VirtualMachine")
        .is_some());
}

#[tokio::test]
async fn if_none_match_yields_not_modified() {
    let (app, _) = test_app(false);
    let (_, headers, _) = send_raw(&app, request(Method::GET, OPENAPI)).await;
    let etag = headers[header::ETAG].clone();

    let mut conditional = request(Method::GET, OPENAPI);
    conditional.headers_mut().insert(header::IF_NONE_MATCH, etag);
    let (status, headers, body) = send_raw(&app, conditional).await;
    assert_eq!(status, StatusCode::NOT_MODIFIED);
    assert!(body.is_empty());
    assert_eq!(headers[header::VARY], "Accept");
}

#[tokio::test]
async fn protobuf_encoding_is_negotiated() {
    let (app, _) = test_app(false);
    let mut accept_proto = request(Method::GET, OPENAPI);
    accept_proto.headers_mut().insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "application/com.github.proto-openapi.spec.v2@v1.0+protobuf, application/json;q=0.9",
        ),
    );
    let (status, headers, body) = send_raw(&app, accept_proto).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], PROTOBUF_CONTENT_TYPE);

    let document = Document::decode(body.as_slice()).unwrap();
    assert_eq!(document.swagger, "2.0");
    let info = document.info.unwrap();
    assert_eq!(info.title, "Open Controll Plane API");
    assert_eq!(info.contact.unwrap().email, "hello@opencp.io");
    assert_eq!(document.tags[0].name, "opencp");

    let (_, _, json_body) = send_raw(&app, request(Method::GET, OPENAPI)).await;
    let json: Value = serde_json::from_slice(&json_body).unwrap();
    let paths = document.paths.unwrap().path;
    assert_eq!(paths.len(), json["paths"].as_object().unwrap().len());
    let vm_items = paths
        .iter()
        .find(|item| item.name == "/apis/opencp.io/v1alpha1/namespaces/{namespace}/virtualmachines")
        .and_then(|item| item.value.as_ref())
        .unwrap();
    assert_eq!(
        vm_items.get.as_ref().unwrap().operation_id,
        "listVirtualMachine"
    );
    let definitions = document.definitions.unwrap().additional_properties;
    assert!(definitions
        .iter()
        .any(|definition| definition.name == "io.opencp.v1alpha1.VirtualMachine"));
}

#[tokio::test]
async fn unacceptable_media_types_are_rejected() {
    let (app, _) = test_app(false);
    let mut html = request(Method::GET, OPENAPI);
    html.headers_mut()
        .insert(header::ACCEPT, HeaderValue::from_static("text/html"));
    let (status, headers, body) = send_raw(&app, html).await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(headers[header::VARY], "Accept");
    let status: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status["kind"], "Status");
    assert_eq!(status["reason"], "NotAcceptable");
    assert_eq!(status["code"], 406);
}

#[tokio::test]
async fn updated_documents_replace_cached_encodings() {
    let (app, state) = test_app(false);
    let (_, first, _) = send_raw(&app, request(Method::GET, OPENAPI)).await;

    state.openapi.update_spec(serde_json::json!({ "swagger": "2.0", "paths": {} }));
    let (status, second, body) = send_raw(&app, request(Method::GET, OPENAPI)).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(first[header::ETAG], second[header::ETAG]);
    assert_eq!(body, br#"{"paths":{},"swagger":"2.0"}"#);
}

#[tokio::test]
async fn failed_regeneration_keeps_serving_the_last_document() {
    let (app, state) = test_app(false);
    let (_, first_headers, first_body) = send_raw(&app, request(Method::GET, OPENAPI)).await;

    state
        .openapi
        .update_spec_with(|| Err(DocumentError::Generate("registry unavailable".to_string())));
    let (status, headers, body) = send_raw(&app, request(Method::GET, OPENAPI)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, first_body);
    assert_eq!(headers[header::ETAG], first_headers[header::ETAG]);
}
