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

//! Request middleware: access log, HTTP metrics and the fixed response headers
//! kubectl expects from an API server.

use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::opencp::logger::log_info;
use crate::opencp::observability::metrics::record_http_request;
use crate::opencp::observability::tracing::with_trace_id;

const COMPONENT: &str = "http";
const UNMATCHED_ROUTE: &str = "unmatched";

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const FLOW_SCHEMA_HEADER: HeaderName = HeaderName::from_static("x-kubernetes-pf-flowschema-uid");
const PRIORITY_LEVEL_HEADER: HeaderName =
    HeaderName::from_static("x-kubernetes-pf-prioritylevel-uid");

/// Address of the connected peer, inserted per connection by the server loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

/// Client address as reported by proxies, falling back to the TCP peer.
pub fn remote_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.to_string()))
        .unwrap_or_default()
}

fn header_text(headers: &HeaderMap, name: impl header::AsHeaderName) -> String {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Logs every request on arrival and completion. Requests without an
/// `x-request-id` are given one, so backend calls carry it too.
pub async fn access_log(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let uri = request.uri().to_string();
    let peer = request.extensions().get::<PeerAddr>().map(|peer| peer.0);
    let remote = remote_address(request.headers(), peer);
    let user_agent = header_text(request.headers(), header::USER_AGENT);
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let request_id = match request_id {
        Some(id) => id,
        None => {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            id
        }
    };

    let trace_id = request_id.replace('-', "");
    with_trace_id(COMPONENT, "request", Some(trace_id.as_str()), async move {
        let fields = [
            ("method", method.as_str()),
            ("uri", uri.as_str()),
            ("remote_address", remote.as_str()),
            ("user_agent", user_agent.as_str()),
            ("request_id", request_id.as_str()),
        ];
        log_info(COMPONENT, "Request received", &fields);

        let start = Instant::now();
        let response = next.run(request).await;
        let status = response.status().as_u16().to_string();
        let time_taken = format!("{:?}", start.elapsed());

        log_info(
            COMPONENT,
            "Request completed",
            &[
                ("method", method.as_str()),
                ("uri", uri.as_str()),
                ("remote_address", remote.as_str()),
                ("user_agent", user_agent.as_str()),
                ("request_id", request_id.as_str()),
                ("status", status.as_str()),
                ("time_taken", time_taken.as_str()),
            ],
        );
        response
    })
    .await
}

/// Counts requests per matched route so label cardinality stays bounded.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    let method = request.method().clone();
    let start = Instant::now();
    let response = next.run(request).await;
    record_http_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}

pub async fn response_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, private"),
    );
    for name in [FLOW_SCHEMA_HEADER, PRIORITY_LEVEL_HEADER] {
        if let Ok(value) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
            headers.insert(name, value);
        }
    }
    response
}
