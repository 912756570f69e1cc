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

//! Control-plane client speaking JSON over HTTP.
//!
//! Every operation is a `POST {host}/opencp.<Kind>Service/<Verb><Kind>` whose
//! body is the request message. A 404 answer means the addressed object does
//! not exist. Reads are retried on transient failures; writes are not.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use super::{BackendError, BackendFuture, CallContext, Filter, LoginService, ResourceBackend};
use crate::opencp::logger::{log_debug, log_warn};
use crate::opencp::resources::{ResourceKind, WireObject};
use crate::opencp::util::error::{with_context, DynError};

const COMPONENT: &str = "backend";
const RETRY_ATTEMPTS: usize = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(2);

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable(err: &BackendError) -> bool {
    match err {
        BackendError::Timeout | BackendError::Unavailable(_) => true,
        BackendError::Rejected { code, .. } => StatusCode::from_u16(*code)
            .map(should_retry_status)
            .unwrap_or(false),
        BackendError::Decode(_) => false,
    }
}

fn next_backoff(current: Duration) -> Duration {
    current
        .checked_mul(2)
        .unwrap_or(MAX_BACKOFF)
        .min(MAX_BACKOFF)
}

fn classify(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Unavailable(err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Retry {
    Idempotent,
    Never,
}

/// Shared HTTP connection to the control plane.
#[derive(Clone)]
pub struct RemoteClient {
    inner: Arc<RemoteInner>,
}

struct RemoteInner {
    http: Client,
    base_url: String,
}

impl RemoteClient {
    pub fn new(host: &str, timeout: Duration) -> Result<Self, DynError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| with_context(err, "Failed to build control-plane HTTP client"))?;
        let trimmed = host.trim().trim_end_matches('/');
        let base_url = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };
        Ok(Self {
            inner: Arc::new(RemoteInner { http, base_url }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn endpoint(&self, service: &str, method: &str) -> String {
        format!("{}/opencp.{service}/{method}", self.inner.base_url)
    }

    async fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        ctx: &CallContext,
        body: &Req,
        retry: Retry,
    ) -> Result<Option<Resp>, BackendError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let attempts = match retry {
            Retry::Idempotent => RETRY_ATTEMPTS,
            Retry::Never => 1,
        };
        let url = self.endpoint(service, method);
        let mut backoff = RETRY_BACKOFF;
        let mut last_err = BackendError::Unavailable("no attempt made".to_string());

        for attempt in 0..attempts {
            match self.send_once(&url, ctx, body).await {
                Ok(value) => return Ok(value),
                Err(err) if is_retryable(&err) && attempt + 1 < attempts => {
                    let error_text = err.to_string();
                    let attempt_text = (attempt + 1).to_string();
                    log_warn(
                        COMPONENT,
                        "Retrying control-plane call",
                        &[
                            ("endpoint", url.as_str()),
                            ("attempt", attempt_text.as_str()),
                            ("error", error_text.as_str()),
                        ],
                    );
                    last_err = err;
                }
                Err(err) => return Err(err),
            }
            sleep(backoff).await;
            backoff = next_backoff(backoff);
        }
        Err(last_err)
    }

    async fn send_once<Req, Resp>(
        &self,
        url: &str,
        ctx: &CallContext,
        body: &Req,
    ) -> Result<Option<Resp>, BackendError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self
            .inner
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if let Some(token) = ctx.token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(request_id) = ctx.request_id.as_deref() {
            request = request.header("x-request-id", request_id);
        }

        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        let status_text = status.as_u16().to_string();
        log_debug(
            COMPONENT,
            "Control-plane call completed",
            &[("endpoint", url), ("status", status_text.as_str())],
        );
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected {
                code: status.as_u16(),
                message: message.trim().to_string(),
            });
        }
        response.json::<Resp>().await.map(Some).map_err(classify)
    }
}

#[derive(Serialize)]
struct CreateRequest<'a, T> {
    object: &'a T,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// [`ResourceBackend`] for one kind, addressed as `opencp.<Kind>Service`.
pub struct RemoteBackend<K> {
    client: RemoteClient,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ResourceKind> RemoteBackend<K> {
    pub fn new(client: RemoteClient) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn service() -> String {
        format!("{}Service", K::descriptor().kind)
    }

    fn method(verb: &str) -> String {
        format!("{verb}{}", K::descriptor().kind)
    }
}

impl<K: ResourceKind> ResourceBackend<K> for RemoteBackend<K> {
    fn list<'a>(
        &'a self,
        ctx: &'a CallContext,
        filter: Filter,
    ) -> BackendFuture<'a, Vec<WireObject<K>>> {
        Box::pin(async move {
            let response: Option<ListResponse<WireObject<K>>> = self
                .client
                .call(&Self::service(), &Self::method("List"), ctx, &filter, Retry::Idempotent)
                .await?;
            Ok(response.map(|list| list.items).unwrap_or_default())
        })
    }

    fn get<'a>(
        &'a self,
        ctx: &'a CallContext,
        filter: Filter,
    ) -> BackendFuture<'a, Option<WireObject<K>>> {
        Box::pin(async move {
            self.client
                .call(&Self::service(), &Self::method("Get"), ctx, &filter, Retry::Idempotent)
                .await
        })
    }

    fn create<'a>(
        &'a self,
        ctx: &'a CallContext,
        object: WireObject<K>,
    ) -> BackendFuture<'a, WireObject<K>> {
        Box::pin(async move {
            let created: Option<WireObject<K>> = self
                .client
                .call(
                    &Self::service(),
                    &Self::method("Create"),
                    ctx,
                    &CreateRequest { object: &object },
                    Retry::Never,
                )
                .await?;
            created.ok_or_else(|| BackendError::Rejected {
                code: 404,
                message: "create endpoint not found".to_string(),
            })
        })
    }

    fn delete<'a>(
        &'a self,
        ctx: &'a CallContext,
        filter: Filter,
    ) -> BackendFuture<'a, Option<WireObject<K>>> {
        Box::pin(async move {
            self.client
                .call(&Self::service(), &Self::method("Delete"), ctx, &filter, Retry::Never)
                .await
        })
    }
}

#[derive(Serialize)]
struct CheckRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    valid: bool,
}

/// Token verification through `opencp.LoginService/Check`.
pub struct RemoteLogin {
    client: RemoteClient,
}

impl RemoteLogin {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }
}

impl LoginService for RemoteLogin {
    fn check<'a>(&'a self, token: &'a str) -> BackendFuture<'a, bool> {
        Box::pin(async move {
            let ctx = CallContext {
                token: Some(token.to_string()),
                request_id: None,
            };
            let response: Option<CheckResponse> = self
                .client
                .call(
                    "LoginService",
                    "Check",
                    &ctx,
                    &CheckRequest { token },
                    Retry::Idempotent,
                )
                .await?;
            Ok(response.map(|body| body.valid).unwrap_or(false))
        })
    }
}
