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

//! Bearer token authentication for the resource API.
//!
//! Requests must come from `kubectl` and carry a bearer token that the login
//! service accepts. Failures are answered with a `Status` envelope.

use std::fmt;

use axum::body::Body;
use axum::extract::{MatchedPath, State};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::handlers::error::ApiError;
use super::AppState;
use crate::opencp::k8s::status::Status;
use crate::opencp::logger::{log_error, log_warn};
use crate::opencp::observability::metrics::{observe_backend_call, BackendOperation};

const AUTH_LOG_COMPONENT: &str = "auth";
const REQUIRED_CLIENT: &str = "kubectl";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthError {
    InvalidAuthorization(String),
    UnsupportedClient,
    MissingToken,
    Rejected,
    Login(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidAuthorization(msg) => {
                write!(f, "invalid authorization header: {msg}")
            }
            AuthError::UnsupportedClient => write!(f, "Not Authorized or not a valid client"),
            AuthError::MissingToken => write!(f, "Not Authorized"),
            AuthError::Rejected => write!(f, "Not Authorized"),
            AuthError::Login(msg) => write!(f, "login service failed: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Login(_) => ApiError::from(Status::internal_error(err.to_string())),
            AuthError::InvalidAuthorization(_) | AuthError::MissingToken | AuthError::Rejected => {
                ApiError::from(Status::unauthorized("Not Authorized"))
            }
            AuthError::UnsupportedClient => ApiError::from(Status::unauthorized(err.to_string())),
        }
    }
}

fn redact_token(token: &str) -> String {
    if token.len() <= 8 {
        "***".to_string()
    } else {
        format!("{}…{}", &token[..4], &token[token.len() - 4..])
    }
}

/// Reads `Authorization: Bearer <token>`. The scheme is matched
/// case-insensitively; `Ok(None)` means no header was sent.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<Option<String>, AuthError> {
    let header_value = match headers.get(AUTHORIZATION) {
        Some(value) => value,
        None => return Ok(None),
    };

    let value = header_value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization("invalid header encoding".to_string()))?;

    let (scheme, rest) = value.split_at(value.find(' ').unwrap_or(value.len()));
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthorization(
            "Authorization header must be a Bearer token".to_string(),
        ));
    }

    let token = rest.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthorization(
            "Authorization header must include a token".to_string(),
        ));
    }

    Ok(Some(token.to_string()))
}

fn is_supported_client(headers: &HeaderMap) -> bool {
    headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|agent| agent.contains(REQUIRED_CLIENT))
        .unwrap_or(false)
}

pub(crate) async fn verify(state: &AppState, headers: &HeaderMap) -> Result<(), AuthError> {
    if !is_supported_client(headers) {
        return Err(AuthError::UnsupportedClient);
    }
    let token = extract_bearer_token(headers)?.ok_or(AuthError::MissingToken)?;
    let valid = observe_backend_call(
        "login",
        BackendOperation::Login,
        state.backends.login.check(&token),
    )
    .await
    .map_err(|err| AuthError::Login(err.to_string()))?;
    if valid {
        Ok(())
    } else {
        let redacted = redact_token(&token);
        log_warn(
            AUTH_LOG_COMPONENT,
            "Rejected bearer token",
            &[("token", redacted.as_str())],
        );
        Err(AuthError::Rejected)
    }
}

/// Middleware guarding every API route when authentication is enabled.
pub async fn authenticate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.auth.enabled {
        return next.run(request).await;
    }

    match verify(&state, request.headers()).await {
        Ok(()) => next.run(request).await,
        Err(err) => {
            let path = request
                .extensions()
                .get::<MatchedPath>()
                .map(|path| path.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            let error_text = err.to_string();
            let metadata = [
                ("method", request.method().as_str()),
                ("path", path.as_str()),
                ("error", error_text.as_str()),
            ];
            if matches!(err, AuthError::Login(_)) {
                log_error(AUTH_LOG_COMPONENT, "Token verification failed", &metadata);
            } else {
                log_warn(AUTH_LOG_COMPONENT, "Rejected unauthenticated request", &metadata);
            }
            ApiError::from(err).into_response()
        }
    }
}
