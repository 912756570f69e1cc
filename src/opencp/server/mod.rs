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

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::Request;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HyperAcceptor;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tower::Service;

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod openapi;

use self::middleware::PeerAddr;
use self::openapi::OpenApiService;
use crate::opencp::backend::remote::RemoteClient;
use crate::opencp::backend::Backends;
use crate::opencp::config::ShimConfig;
use crate::opencp::logger::{log_error, log_info, log_warn};
use crate::opencp::resources::kinds::{
    DatabaseKind, DomainKind, FirewallKind, IpKind, KubernetesClusterKind, NamespaceKind,
    ObjectStorageCredentialKind, ObjectStorageKind, SshKeyKind, VirtualMachineKind,
};
use crate::opencp::util::error::{with_context, DynError};

const COMPONENT: &str = "server";

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub backends: Backends,
    pub openapi: Arc<OpenApiService>,
    pub config: Arc<ShimConfig>,
}

impl AppState {
    /// State with the OpenAPI document generated from the kind registry.
    pub fn new(config: ShimConfig, backends: Backends) -> Self {
        let openapi = OpenApiService::new();
        openapi.update_spec_with(|| Ok(openapi::document::registry_document()));
        AppState {
            backends,
            openapi: Arc::new(openapi),
            config: Arc::new(config),
        }
    }

    /// Backends selected by configuration: remote when a control-plane host
    /// is set, in-memory otherwise.
    pub fn from_config(config: ShimConfig) -> Result<Self, DynError> {
        let backends = if config.uses_remote_backend() {
            let timeout = config.backend.timeout()?;
            let client = RemoteClient::new(&config.backend.host, timeout)?;
            Backends::remote(client)
        } else {
            Backends::in_memory(config.auth.tokens.clone())
        };
        Ok(Self::new(config, backends))
    }
}

#[derive(Clone)]
struct InjectRemoteAddr<S> {
    inner: S,
    remote_addr: SocketAddr,
}

impl<S> InjectRemoteAddr<S> {
    fn new(inner: S, remote_addr: SocketAddr) -> Self {
        Self { inner, remote_addr }
    }
}

impl<S, ReqBody> Service<Request<ReqBody>> for InjectRemoteAddr<S>
where
    S: Service<Request<ReqBody>, Response = Response, Error = Infallible>,
{
    type Response = Response;
    type Error = Infallible;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        request.extensions_mut().insert(PeerAddr(self.remote_addr));
        self.inner.call(request)
    }
}

/// Binds the API listener (and the metrics listener when configured) and
/// serves until the API listener fails.
pub async fn serve(config: ShimConfig) -> Result<(), DynError> {
    let addr = config.server.listen_addr()?;
    let metrics_addr = config.server.metrics_addr()?;
    if config.uses_remote_backend() {
        log_info(
            COMPONENT,
            "Using remote control plane",
            &[("host", config.backend.host.as_str())],
        );
    } else {
        log_warn(
            COMPONENT,
            "No control-plane host configured; using in-memory backends",
            &[],
        );
    }
    if !config.auth.enabled {
        log_warn(COMPONENT, "Authentication disabled", &[]);
    }

    let state = AppState::from_config(config)?;

    if let Some(metrics_addr) = metrics_addr {
        let listener = TcpListener::bind(metrics_addr).await.map_err(|e| {
            with_context(e, format!("Failed to bind metrics listener at {metrics_addr}"))
        })?;
        let app = build_metrics_router(state.clone());
        tokio::spawn(async move {
            if let Err(err) = accept_loop(listener, app, "metrics").await {
                let error_text = err.to_string();
                log_error(
                    COMPONENT,
                    "Metrics listener stopped",
                    &[("error", error_text.as_str())],
                );
            }
        });
    }

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| with_context(e, format!("Failed to bind server listener at {addr}")))?;
    accept_loop(listener, build_router(state), "api").await
}

async fn accept_loop(listener: TcpListener, app: Router, name: &str) -> Result<(), DynError> {
    let listen_addr = listener
        .local_addr()
        .map_err(|e| with_context(e, "Failed to read listener address"))?;
    let listen_addr_text = listen_addr.to_string();
    log_info(
        COMPONENT,
        "HTTP server listening",
        &[("listener", name), ("addr", listen_addr_text.as_str())],
    );

    loop {
        let (stream, remote_addr) = listener
            .accept()
            .await
            .map_err(|e| with_context(e, "Failed to accept incoming TCP connection"))?;
        let service = TowerToHyperService::new(InjectRemoteAddr::new(app.clone(), remote_addr));
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            if let Err(err) = HyperAcceptor::new(TokioExecutor::new())
                .serve_connection(io, service)
                .await
            {
                let should_log = err
                    .downcast_ref::<hyper::Error>()
                    .map(|hyper_err| !(hyper_err.is_closed() || hyper_err.is_incomplete_message()))
                    .unwrap_or(true);
                if should_log {
                    let error_text = err.to_string();
                    let listen_addr_text = listen_addr.to_string();
                    let remote_addr_text = remote_addr.to_string();
                    log_error(
                        COMPONENT,
                        "HTTP serving error",
                        &[
                            ("listen_addr", listen_addr_text.as_str()),
                            ("remote_addr", remote_addr_text.as_str()),
                            ("error", error_text.as_str()),
                        ],
                    );
                }
            }
        });
    }
}

pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/version", get(handlers::discovery::version))
        .route("/api", get(handlers::discovery::core_api_versions))
        .route("/api/v1", get(handlers::discovery::core_api_resources))
        .route("/apis", get(handlers::discovery::api_groups))
        .route(
            "/apis/opencp.io",
            get(handlers::discovery::opencp_api_group),
        )
        .route(
            "/apis/opencp.io/v1alpha1",
            get(handlers::discovery::opencp_api_resources),
        )
        .route("/api/v1/events", get(handlers::events::list_all))
        .route(
            "/api/v1/namespaces/{namespace}/events",
            get(handlers::events::list_namespaced),
        )
        .route("/openapi/v2", get(openapi::serve_document));

    let router = [
        handlers::resources::register::<NamespaceKind>,
        handlers::resources::register::<VirtualMachineKind>,
        handlers::resources::register::<KubernetesClusterKind>,
        handlers::resources::register::<FirewallKind>,
        handlers::resources::register::<DatabaseKind>,
        handlers::resources::register::<DomainKind>,
        handlers::resources::register::<SshKeyKind>,
        handlers::resources::register::<ObjectStorageKind>,
        handlers::resources::register::<ObjectStorageCredentialKind>,
        handlers::resources::register::<IpKind>,
    ]
    .into_iter()
    .fold(router, |router, register| register(router));

    router
        .layer(from_fn_with_state(state.clone(), auth::authenticate))
        .layer(from_fn(middleware::track_metrics))
        .layer(from_fn(middleware::access_log))
        .layer(from_fn(middleware::response_headers))
        .with_state(state)
}

/// Unauthenticated listener for Prometheus scrapes and health probes.
pub fn build_metrics_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(handlers::observability::metrics))
        .route("/healthz", get(handlers::observability::healthz))
        .with_state(state)
}
