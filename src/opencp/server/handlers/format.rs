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

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use super::error::ApiError;
use crate::opencp::k8s::table::{Table, TABLE_CONTENT_TYPE};

const YAML_CONTENT_TYPE: &str = "application/yaml";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn negotiate(format: Option<&str>, headers: &HeaderMap) -> Self {
        if let Some(explicit) = format {
            match explicit.to_ascii_lowercase().as_str() {
                "yaml" | "yml" => return OutputFormat::Yaml,
                "json" => return OutputFormat::Json,
                _ => {}
            }
        }

        if let Some(accept) = headers
            .get(header::ACCEPT)
            .and_then(|value| value.to_str().ok())
        {
            for candidate in accept.split(',').map(|s| s.trim().to_ascii_lowercase()) {
                if candidate.contains("yaml") {
                    return OutputFormat::Yaml;
                }
            }
        }

        OutputFormat::Json
    }
}

/// `kubectl get` asks for `application/json;as=Table;...`; any Accept value
/// containing `Table` selects the projection.
pub fn wants_table(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.contains("Table"))
}

pub fn respond_with<T>(value: T, format: OutputFormat) -> Result<Response, ApiError>
where
    T: Serialize,
{
    respond_with_status(StatusCode::OK, value, format)
}

pub fn respond_with_status<T>(
    status: StatusCode,
    value: T,
    format: OutputFormat,
) -> Result<Response, ApiError>
where
    T: Serialize,
{
    match format {
        OutputFormat::Json => Ok((status, Json(value)).into_response()),
        OutputFormat::Yaml => {
            let body = serde_yaml::to_string(&value)
                .map_err(|err| ApiError::internal_message(err.to_string()))?;
            Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, YAML_CONTENT_TYPE)
                .body(Body::from(body))
                .map_err(|err| ApiError::internal_message(err.to_string()))
        }
    }
}

pub fn respond_table(table: Table) -> Response {
    let mut response = Json(table).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(TABLE_CONTENT_TYPE),
    );
    response
}
