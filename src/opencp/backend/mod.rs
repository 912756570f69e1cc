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

//! Backend client facade.
//!
//! Each resource kind is served by a [`ResourceBackend`]. Absence is reported
//! as `Ok(None)` and is the only outcome the HTTP layer turns into a 404;
//! every other failure is a [`BackendError`].

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::opencp::resources::kinds::{
    DatabaseKind, DomainKind, FirewallKind, IpKind, KubernetesClusterKind, NamespaceKind,
    ObjectStorageCredentialKind, ObjectStorageKind, SshKeyKind, VirtualMachineKind,
};
use crate::opencp::resources::{ResourceKind, WireObject};
use crate::opencp::server::auth::extract_bearer_token;

pub mod in_memory;
pub mod remote;
pub mod wire;

pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The control plane could not be reached.
    Unavailable(String),
    Timeout,
    /// The control plane answered with an error.
    Rejected { code: u16, message: String },
    /// The response could not be decoded.
    Decode(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable(msg) => write!(f, "backend unavailable: {msg}"),
            BackendError::Timeout => write!(f, "backend call timed out"),
            BackendError::Rejected { code, message } => {
                write!(f, "backend rejected request ({code}): {message}")
            }
            BackendError::Decode(msg) => write!(f, "invalid backend response: {msg}"),
        }
    }
}

impl Error for BackendError {}

/// Per-request data forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub token: Option<String>,
    pub request_id: Option<String>,
}

impl CallContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        CallContext {
            token: extract_bearer_token(headers).ok().flatten(),
            request_id: headers
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        }
    }
}

/// Selection criteria for list, get and delete calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Filter {
    pub fn named(name: impl Into<String>, namespace: Option<String>) -> Self {
        Filter {
            name: Some(name.into()),
            namespace,
        }
    }

    pub fn namespace(namespace: Option<String>) -> Self {
        Filter {
            name: None,
            namespace,
        }
    }
}

pub trait ResourceBackend<K: ResourceKind>: Send + Sync {
    fn list<'a>(&'a self, ctx: &'a CallContext, filter: Filter)
        -> BackendFuture<'a, Vec<WireObject<K>>>;

    fn get<'a>(&'a self, ctx: &'a CallContext, filter: Filter)
        -> BackendFuture<'a, Option<WireObject<K>>>;

    fn create<'a>(&'a self, ctx: &'a CallContext, object: WireObject<K>)
        -> BackendFuture<'a, WireObject<K>>;

    /// Returns the removed object, or `None` when nothing matched.
    fn delete<'a>(&'a self, ctx: &'a CallContext, filter: Filter)
        -> BackendFuture<'a, Option<WireObject<K>>>;
}

/// External token verification.
pub trait LoginService: Send + Sync {
    fn check<'a>(&'a self, token: &'a str) -> BackendFuture<'a, bool>;
}

/// One backend per kind plus the login service, shared by all handlers.
#[derive(Clone)]
pub struct Backends {
    pub virtual_machines: Arc<dyn ResourceBackend<VirtualMachineKind>>,
    pub kubernetes_clusters: Arc<dyn ResourceBackend<KubernetesClusterKind>>,
    pub firewalls: Arc<dyn ResourceBackend<FirewallKind>>,
    pub domains: Arc<dyn ResourceBackend<DomainKind>>,
    pub ssh_keys: Arc<dyn ResourceBackend<SshKeyKind>>,
    pub object_storages: Arc<dyn ResourceBackend<ObjectStorageKind>>,
    pub object_storage_credentials: Arc<dyn ResourceBackend<ObjectStorageCredentialKind>>,
    pub databases: Arc<dyn ResourceBackend<DatabaseKind>>,
    pub ips: Arc<dyn ResourceBackend<IpKind>>,
    pub namespaces: Arc<dyn ResourceBackend<NamespaceKind>>,
    pub login: Arc<dyn LoginService>,
}

impl Backends {
    /// Process-local storage for every kind; tokens listed in `tokens` pass
    /// the login check.
    pub fn in_memory(tokens: Vec<String>) -> Self {
        use in_memory::{InMemoryBackend, StaticTokenLogin};
        Backends {
            virtual_machines: Arc::new(InMemoryBackend::new()),
            kubernetes_clusters: Arc::new(InMemoryBackend::new()),
            firewalls: Arc::new(InMemoryBackend::new()),
            domains: Arc::new(InMemoryBackend::new()),
            ssh_keys: Arc::new(InMemoryBackend::new()),
            object_storages: Arc::new(InMemoryBackend::new()),
            object_storage_credentials: Arc::new(InMemoryBackend::new()),
            databases: Arc::new(InMemoryBackend::new()),
            ips: Arc::new(InMemoryBackend::new()),
            namespaces: Arc::new(InMemoryBackend::new()),
            login: Arc::new(StaticTokenLogin::new(tokens)),
        }
    }

    /// Remote control plane reached through `client`.
    pub fn remote(client: remote::RemoteClient) -> Self {
        use remote::{RemoteBackend, RemoteLogin};
        Backends {
            virtual_machines: Arc::new(RemoteBackend::new(client.clone())),
            kubernetes_clusters: Arc::new(RemoteBackend::new(client.clone())),
            firewalls: Arc::new(RemoteBackend::new(client.clone())),
            domains: Arc::new(RemoteBackend::new(client.clone())),
            ssh_keys: Arc::new(RemoteBackend::new(client.clone())),
            object_storages: Arc::new(RemoteBackend::new(client.clone())),
            object_storage_credentials: Arc::new(RemoteBackend::new(client.clone())),
            databases: Arc::new(RemoteBackend::new(client.clone())),
            ips: Arc::new(RemoteBackend::new(client.clone())),
            namespaces: Arc::new(RemoteBackend::new(client.clone())),
            login: Arc::new(RemoteLogin::new(client)),
        }
    }
}
