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

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::opencp::backend::BackendError;
use crate::opencp::k8s::status::Status;
use crate::opencp::resources::KindDescriptor;

/// Failure answered with a `meta.k8s.io/v1` `Status` body.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: Status,
}

impl ApiError {
    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Status::bad_request(message).into()
    }

    pub fn internal_message(message: impl Into<String>) -> Self {
        Status::internal_error(message).into()
    }

    pub fn not_found(descriptor: &KindDescriptor, name: &str) -> Self {
        Status::not_found(descriptor.plural, descriptor.group, name).into()
    }

    /// Backend failures are reported as 500 with the failed operation named.
    pub fn backend(operation: &str, descriptor: &KindDescriptor, err: &BackendError) -> Self {
        Self::internal_message(format!(
            "failed to {operation} {}: {err}",
            descriptor.plural
        ))
    }
}

impl From<Status> for ApiError {
    fn from(status: Status) -> Self {
        ApiError { status }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code =
            StatusCode::from_u16(self.status.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, Json(self.status)).into_response()
    }
}
