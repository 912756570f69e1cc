/*
 * Copyright (C) 2024 The OpenCP Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Generic list/get/create/delete handlers shared by every resource kind.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use super::error::ApiError;
use super::format::{respond_table, respond_with, respond_with_status, wants_table, OutputFormat};
use super::selectors::parse_field_selector;
use crate::opencp::backend::{BackendError, CallContext, Filter};
use crate::opencp::k8s::status::Status;
use crate::opencp::logger::log_error;
use crate::opencp::observability::metrics::{observe_backend_call, BackendOperation};
use crate::opencp::resources::{mapper, RequestTarget, ResourceKind, WireObject};
use crate::opencp::server::AppState;

const COMPONENT: &str = "resources";

/// Kinds whose item routes answer PATCH with 405 instead of the router default.
const PATCH_REJECTED: &[&str] = &["kubernetesclusters"];

#[derive(Debug, Default, Deserialize)]
pub struct ResourceQuery {
    #[serde(rename = "fieldSelector")]
    pub field_selector: Option<String>,
    pub format: Option<String>,
}

/// Registers the REST routes of `K` on `router`.
pub fn register<K: ResourceKind>(router: Router<AppState>) -> Router<AppState> {
    let descriptor = K::descriptor();
    let base = descriptor.base_path();
    let plural = descriptor.plural;

    if descriptor.group.is_empty() {
        // Core namespaces: the object name is the `{namespace}` segment.
        return router
            .route(
                &format!("{base}/{plural}"),
                get(list_all::<K>).post(create_unscoped::<K>),
            )
            .route(
                &format!("{base}/{plural}/{{namespace}}"),
                get(get_one::<K>).delete(delete_one::<K>),
            );
    }

    let collection = if descriptor.namespaced {
        get(list_all::<K>)
    } else {
        get(list_all::<K>).post(create_unscoped::<K>)
    };
    let mut router = router
        .route(&format!("{base}/{plural}"), collection)
        .route(
            &format!("{base}/namespaces/{{namespace}}/{plural}"),
            get(list::<K>).post(create::<K>),
        )
        .route(
            &format!("{base}/namespaces/{{namespace}}/{plural}/{{name}}"),
            item_routes::<K>(),
        );
    if !descriptor.namespaced {
        router = router.route(&format!("{base}/{plural}/{{name}}"), item_routes::<K>());
    }
    router
}

fn item_routes<K: ResourceKind>() -> MethodRouter<AppState> {
    let routes = get(get_one::<K>).delete(delete_one::<K>);
    if PATCH_REJECTED.contains(&K::descriptor().plural) {
        routes.patch(patch_not_allowed::<K>)
    } else {
        routes
    }
}

pub async fn list_all<K: ResourceKind>(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
    headers: HeaderMap,
) -> Response {
    respond(list_impl::<K>(&state, &HashMap::new(), query, &headers).await)
}

pub async fn list<K: ResourceKind>(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ResourceQuery>,
    headers: HeaderMap,
) -> Response {
    respond(list_impl::<K>(&state, &params, query, &headers).await)
}

pub async fn get_one<K: ResourceKind>(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ResourceQuery>,
    headers: HeaderMap,
) -> Response {
    respond(get_impl::<K>(&state, &params, query, &headers).await)
}

pub async fn create_unscoped<K: ResourceKind>(
    State(state): State<AppState>,
    Query(query): Query<ResourceQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(create_impl::<K>(&state, &HashMap::new(), query, &headers, &body).await)
}

pub async fn create<K: ResourceKind>(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ResourceQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    respond(create_impl::<K>(&state, &params, query, &headers, &body).await)
}

pub async fn delete_one<K: ResourceKind>(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    Query(query): Query<ResourceQuery>,
    headers: HeaderMap,
) -> Response {
    respond(delete_impl::<K>(&state, &params, query, &headers).await)
}

/// Kubernetes clusters cannot be modified in place.
pub async fn patch_not_allowed<K: ResourceKind>() -> Response {
    ApiError::from(Status::method_not_allowed(format!(
        "PATCH is not supported for {}",
        K::descriptor().plural
    )))
    .into_response()
}

fn respond(result: Result<Response, ApiError>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}

/// Path namespace, ignored for cluster-scoped kinds.
fn resolve_target<K: ResourceKind>(params: &HashMap<String, String>) -> RequestTarget {
    let mut target = K::target(params);
    if !K::descriptor().namespaced {
        target.namespace = None;
    }
    target
}

fn backend_failure<K: ResourceKind>(operation: &str, err: BackendError) -> ApiError {
    let error_text = err.to_string();
    log_error(
        COMPONENT,
        "Backend call failed",
        &[
            ("kind", K::descriptor().kind),
            ("operation", operation),
            ("error", error_text.as_str()),
        ],
    );
    ApiError::backend(operation, K::descriptor(), &err)
}

pub async fn list_impl<K: ResourceKind>(
    state: &AppState,
    params: &HashMap<String, String>,
    query: ResourceQuery,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let descriptor = K::descriptor();
    let selector = parse_field_selector(query.field_selector.as_deref())?;
    let target = resolve_target::<K>(params);
    let ctx = CallContext::from_headers(headers);
    let backend = K::backend(&state.backends);

    let mut namespace = target.namespace;
    if descriptor.namespaced {
        if let Some(requested) = selector.metadata_namespace.filter(|ns| !ns.is_empty()) {
            if namespace.as_deref().is_some_and(|ns| ns != requested) {
                return render_list::<K>(Vec::new(), query.format.as_deref(), headers);
            }
            namespace = Some(requested);
        }
    }

    let objects = match selector.metadata_name {
        Some(name) => {
            let found = observe_backend_call(
                descriptor.plural,
                BackendOperation::Get,
                backend.get(&ctx, Filter::named(name, namespace)),
            )
            .await
            .map_err(|err| backend_failure::<K>("get", err))?;
            found.into_iter().collect()
        }
        None => observe_backend_call(
            descriptor.plural,
            BackendOperation::List,
            backend.list(&ctx, Filter::namespace(namespace)),
        )
        .await
        .map_err(|err| backend_failure::<K>("list", err))?,
    };

    render_list::<K>(objects, query.format.as_deref(), headers)
}

fn render_list<K: ResourceKind>(
    objects: Vec<WireObject<K>>,
    format: Option<&str>,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    if wants_table(headers) {
        return Ok(respond_table(mapper::to_table::<K>(&objects, Utc::now())));
    }
    respond_with(
        mapper::to_list::<K>(&objects),
        OutputFormat::negotiate(format, headers),
    )
}

pub async fn get_impl<K: ResourceKind>(
    state: &AppState,
    params: &HashMap<String, String>,
    query: ResourceQuery,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let descriptor = K::descriptor();
    let target = resolve_target::<K>(params);
    let name = target
        .name
        .ok_or_else(|| ApiError::bad_request("resource name is required"))?;
    let ctx = CallContext::from_headers(headers);

    let found = observe_backend_call(
        descriptor.plural,
        BackendOperation::Get,
        K::backend(&state.backends).get(&ctx, Filter::named(name.clone(), target.namespace)),
    )
    .await
    .map_err(|err| backend_failure::<K>("get", err))?;
    let object = found.ok_or_else(|| ApiError::not_found(descriptor, &name))?;

    let resource = mapper::to_resource::<K>(&object).map_err(|err| {
        ApiError::internal_message(format!("failed to convert {} {name}: {err}", descriptor.kind))
    })?;

    if wants_table(headers) {
        return Ok(respond_table(mapper::single_row_table::<K>(
            &resource,
            Utc::now(),
        )));
    }
    respond_with(resource, OutputFormat::negotiate(query.format.as_deref(), headers))
}

fn decode_body<K: ResourceKind>(headers: &HeaderMap, body: &[u8]) -> Result<WireObject<K>, ApiError> {
    let is_yaml = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().contains("yaml"))
        .unwrap_or(false);
    let decoded = if is_yaml {
        serde_yaml::from_slice::<WireObject<K>>(body).map_err(|err| err.to_string())
    } else {
        serde_json::from_slice::<WireObject<K>>(body).map_err(|err| err.to_string())
    };
    decoded.map_err(|err| {
        ApiError::bad_request(format!(
            "invalid {} request body: {err}",
            K::descriptor().kind
        ))
    })
}

pub async fn create_impl<K: ResourceKind>(
    state: &AppState,
    params: &HashMap<String, String>,
    query: ResourceQuery,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    let descriptor = K::descriptor();
    let target = resolve_target::<K>(params);
    let mut object = decode_body::<K>(headers, body)?;

    let metadata = object.metadata.get_or_insert_with(Default::default);
    if descriptor.namespaced {
        if let Some(path_ns) = target.namespace {
            let body_ns = metadata.namespace.as_deref().unwrap_or_default();
            if !body_ns.is_empty() && body_ns != path_ns {
                return Err(ApiError::bad_request(
                    "the namespace of the provided object does not match the namespace sent on the request",
                ));
            }
            metadata.namespace = Some(path_ns);
        }
    }

    let ctx = CallContext::from_headers(headers);
    let created = observe_backend_call(
        descriptor.plural,
        BackendOperation::Create,
        K::backend(&state.backends).create(&ctx, object),
    )
    .await
    .map_err(|err| backend_failure::<K>("create", err))?;

    let resource = mapper::to_resource::<K>(&created).map_err(|err| {
        ApiError::internal_message(format!(
            "failed to convert created {}: {err}",
            descriptor.kind
        ))
    })?;
    respond_with_status(
        StatusCode::CREATED,
        resource,
        OutputFormat::negotiate(query.format.as_deref(), headers),
    )
}

pub async fn delete_impl<K: ResourceKind>(
    state: &AppState,
    params: &HashMap<String, String>,
    query: ResourceQuery,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let descriptor = K::descriptor();
    let target = resolve_target::<K>(params);
    let name = target
        .name
        .ok_or_else(|| ApiError::bad_request("resource name is required"))?;
    let ctx = CallContext::from_headers(headers);

    let removed = observe_backend_call(
        descriptor.plural,
        BackendOperation::Delete,
        K::backend(&state.backends).delete(&ctx, Filter::named(name.clone(), target.namespace)),
    )
    .await
    .map_err(|err| backend_failure::<K>("delete", err))?;
    let object = removed.ok_or_else(|| ApiError::not_found(descriptor, &name))?;

    let uid = object
        .metadata
        .as_ref()
        .map(|meta| meta.uid_str().to_string())
        .unwrap_or_default();
    let status = Status::deleted(
        descriptor.plural,
        descriptor.group,
        object.name().unwrap_or(name.as_str()),
        &uid,
    );
    respond_with(status, OutputFormat::negotiate(query.format.as_deref(), headers))
}
