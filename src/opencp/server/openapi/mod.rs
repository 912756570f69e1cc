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

//! OpenAPI document service.
//!
//! The document is installed with [`OpenApiService::update_spec`]. Each
//! encoding (JSON, protobuf, ETag) is a lazy entry computed on first read and
//! memoized until the next update. A failed computation falls back to the
//! payload memoized for the previous document, when there is one.

use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use prost::Message;
use serde_json::Value;
use sha2::{Digest, Sha512};

use crate::opencp::k8s::status::Status;
use crate::opencp::logger::log_error;
use crate::opencp::observability::metrics::record_openapi_generation;
use crate::opencp::server::handlers::error::ApiError;
use crate::opencp::server::AppState;

pub mod document;
pub mod negotiation;
pub mod proto;

const COMPONENT: &str = "openapi";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const PROTOBUF_CONTENT_TYPE: &str = "application/com.github.proto-openapi.spec.v2@v1.0+protobuf";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentError {
    /// No document has been installed yet.
    NotInitialized,
    Generate(String),
    Encode(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::NotInitialized => write!(f, "OpenAPI document not initialised"),
            DocumentError::Generate(msg) => write!(f, "failed to generate OpenAPI document: {msg}"),
            DocumentError::Encode(msg) => write!(f, "failed to encode OpenAPI document: {msg}"),
        }
    }
}

impl std::error::Error for DocumentError {}

/// Encodings offered by `/openapi/v2`, in preference order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Protobuf,
}

impl Encoding {
    pub const OFFERED: [Encoding; 2] = [Encoding::Json, Encoding::Protobuf];

    pub fn content_type(self) -> &'static str {
        match self {
            Encoding::Json => JSON_CONTENT_TYPE,
            Encoding::Protobuf => PROTOBUF_CONTENT_TYPE,
        }
    }

    fn media_range(self) -> (&'static str, &'static str) {
        let content_type = self.content_type();
        content_type.split_once('/').unwrap_or((content_type, ""))
    }

    fn label(self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::Protobuf => "protobuf",
        }
    }

    /// Picks the encoding for an `Accept` header, or `None` when nothing
    /// offered is acceptable.
    pub fn negotiate(accept: Option<&str>) -> Option<Encoding> {
        let offers: Vec<(&str, &str)> = Self::OFFERED.iter().map(|e| e.media_range()).collect();
        negotiation::negotiate(accept, &offers).map(|index| Self::OFFERED[index])
    }
}

type Builder = Box<dyn Fn() -> Result<Bytes, DocumentError> + Send + Sync>;

/// Value computed at most once, on first read.
struct LazyEntry {
    build: Builder,
    value: OnceLock<Result<Bytes, DocumentError>>,
}

impl LazyEntry {
    fn new(build: Builder) -> Arc<Self> {
        Arc::new(LazyEntry {
            build,
            value: OnceLock::new(),
        })
    }

    fn get(&self) -> Result<Bytes, DocumentError> {
        self.value.get_or_init(|| (self.build)()).clone()
    }

    fn memoized(&self) -> Option<Bytes> {
        self.value.get().and_then(|result| result.as_ref().ok().cloned())
    }
}

/// A lazy entry plus the last payload successfully produced for the same
/// encoding by an earlier document.
struct Slot {
    entry: Arc<LazyEntry>,
    previous: Option<(Bytes, DateTime<Utc>)>,
}

impl Slot {
    fn replace(old: Option<&Slot>, entry: Arc<LazyEntry>, old_modified: DateTime<Utc>) -> Slot {
        let previous = old.and_then(|slot| {
            slot.entry
                .memoized()
                .map(|bytes| (bytes, old_modified))
                .or_else(|| slot.previous.clone())
        });
        Slot { entry, previous }
    }
}

struct CacheState {
    version: u64,
    last_modified: DateTime<Utc>,
    json: Slot,
    protobuf: Slot,
    etag: Slot,
}

/// Bytes selected for one response.
#[derive(Clone, Debug)]
pub struct ServedDocument {
    pub payload: Bytes,
    pub etag: Option<String>,
    pub last_modified: DateTime<Utc>,
    /// The payload belongs to an earlier document.
    pub stale: bool,
}

#[derive(Default)]
pub struct OpenApiService {
    state: RwLock<Option<CacheState>>,
}

impl OpenApiService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: Value) -> Self {
        let service = Self::new();
        service.update_spec(document);
        service
    }

    pub fn update_spec(&self, document: Value) {
        self.update_spec_with(move || Ok(document.clone()));
    }

    /// Installs a new document generator. Nothing is computed until the
    /// first read of an encoding.
    pub fn update_spec_with<F>(&self, generate: F)
    where
        F: Fn() -> Result<Value, DocumentError> + Send + Sync + 'static,
    {
        self.install(generate, to_protobuf);
    }

    fn install<F, P>(&self, generate: F, encode_protobuf: P)
    where
        F: Fn() -> Result<Value, DocumentError> + Send + Sync + 'static,
        P: Fn(&[u8]) -> Result<Bytes, DocumentError> + Send + Sync + 'static,
    {
        let json = LazyEntry::new(Box::new(move || {
            let result = generate().and_then(|document| {
                serde_json::to_vec(&document)
                    .map(Bytes::from)
                    .map_err(|err| DocumentError::Encode(err.to_string()))
            });
            record_openapi_generation(Encoding::Json.label(), result.is_ok());
            result
        }));
        let protobuf = {
            let json = Arc::clone(&json);
            LazyEntry::new(Box::new(move || {
                let result = json.get().and_then(|bytes| encode_protobuf(&bytes));
                record_openapi_generation(Encoding::Protobuf.label(), result.is_ok());
                result
            }))
        };
        let etag = {
            let json = Arc::clone(&json);
            LazyEntry::new(Box::new(move || {
                json.get().map(|bytes| Bytes::from(compute_etag(&bytes)))
            }))
        };

        let now = Utc::now();
        let mut guard = self.state.write().expect("openapi cache lock poisoned");
        let old = guard.take();
        let old_modified = old.as_ref().map(|s| s.last_modified).unwrap_or(now);
        *guard = Some(CacheState {
            version: old.as_ref().map(|s| s.version + 1).unwrap_or(1),
            last_modified: now,
            json: Slot::replace(old.as_ref().map(|s| &s.json), json, old_modified),
            protobuf: Slot::replace(old.as_ref().map(|s| &s.protobuf), protobuf, old_modified),
            etag: Slot::replace(old.as_ref().map(|s| &s.etag), etag, old_modified),
        });
    }

    /// Number of documents installed so far.
    pub fn version(&self) -> u64 {
        self.state
            .read()
            .expect("openapi cache lock poisoned")
            .as_ref()
            .map(|state| state.version)
            .unwrap_or(0)
    }

    pub fn get_document(&self, encoding: Encoding) -> Result<ServedDocument, DocumentError> {
        // Entries are cloned out so computation runs without holding the lock.
        let (payload_entry, payload_previous, etag_entry, etag_previous, last_modified) = {
            let guard = self.state.read().expect("openapi cache lock poisoned");
            let state = guard.as_ref().ok_or(DocumentError::NotInitialized)?;
            let slot = match encoding {
                Encoding::Json => &state.json,
                Encoding::Protobuf => &state.protobuf,
            };
            (
                Arc::clone(&slot.entry),
                slot.previous.clone(),
                Arc::clone(&state.etag.entry),
                state.etag.previous.clone(),
                state.last_modified,
            )
        };

        match payload_entry.get() {
            Ok(payload) => Ok(ServedDocument {
                payload,
                etag: etag_entry.get().ok().map(|tag| bytes_to_string(&tag)),
                last_modified,
                stale: false,
            }),
            Err(err) => {
                let (payload, modified) = payload_previous.ok_or(err)?;
                Ok(ServedDocument {
                    payload,
                    etag: etag_previous.map(|(tag, _)| bytes_to_string(&tag)),
                    last_modified: modified,
                    stale: true,
                })
            }
        }
    }

    /// True when the JSON encoding of the current document is available.
    pub fn is_ready(&self) -> bool {
        self.get_document(Encoding::Json)
            .map(|document| !document.stale)
            .unwrap_or(false)
    }
}

fn bytes_to_string(bytes: &Bytes) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Upper-case hex SHA-512 of the JSON encoding.
pub fn compute_etag(json: &[u8]) -> String {
    hex::encode_upper(Sha512::digest(json))
}

/// `openapi_v2.Document` encoding of the JSON document.
fn to_protobuf(json: &[u8]) -> Result<Bytes, DocumentError> {
    let document: Value =
        serde_json::from_slice(json).map_err(|err| DocumentError::Encode(err.to_string()))?;
    let document = proto::document_from_json(&document).map_err(DocumentError::Encode)?;
    Ok(Bytes::from(document.encode_to_vec()))
}

pub async fn serve_document(State(state): State<AppState>, headers: HeaderMap) -> Response {
    serve_document_impl(&state.openapi, &headers)
}

pub fn serve_document_impl(service: &OpenApiService, headers: &HeaderMap) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());

    let mut response = match Encoding::negotiate(accept) {
        None => ApiError::from(Status::not_acceptable(format!(
            "only the following media types are accepted: {}",
            Encoding::OFFERED.map(Encoding::content_type).join(", ")
        )))
        .into_response(),
        Some(encoding) => match service.get_document(encoding) {
            Ok(document) => document_response(encoding, document, headers),
            Err(err) => {
                let error_text = err.to_string();
                log_error(
                    COMPONENT,
                    "OpenAPI document unavailable",
                    &[
                        ("encoding", encoding.label()),
                        ("error", error_text.as_str()),
                    ],
                );
                ApiError::from(Status::service_unavailable(error_text)).into_response()
            }
        },
    };
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("Accept"));
    response
}

fn document_response(encoding: Encoding, document: ServedDocument, headers: &HeaderMap) -> Response {
    let etag = document.etag.map(|tag| format!("\"{tag}\""));
    let not_modified = etag.as_deref().is_some_and(|tag| {
        headers
            .get(header::IF_NONE_MATCH)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|candidates| {
                candidates
                    .split(',')
                    .map(str::trim)
                    .any(|candidate| candidate == tag || candidate == "*")
            })
    });

    let mut builder = axum::http::Response::builder().header(
        header::LAST_MODIFIED,
        document.last_modified.format(HTTP_DATE_FORMAT).to_string(),
    );
    if let Some(tag) = etag.as_deref() {
        builder = builder.header(header::ETAG, tag);
    }
    let built = if not_modified {
        builder.status(StatusCode::NOT_MODIFIED).body(Body::empty())
    } else {
        builder
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, encoding.content_type())
            .body(Body::from(document.payload))
    };
    built.unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
