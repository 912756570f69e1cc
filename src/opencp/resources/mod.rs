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

//! Resource kind registry.
//!
//! Every kind served by the shim is described once by a [`KindDescriptor`] and a
//! [`ResourceKind`] implementation tying together its backend wire schema, its
//! client-facing schema, its table columns and the backend that stores it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::opencp::api::Resource;
use crate::opencp::backend::wire::BackendObject;
use crate::opencp::backend::{Backends, ResourceBackend};
use crate::opencp::k8s::discovery::APIResource;
use crate::opencp::k8s::table::TableColumnDefinition;

pub mod kinds;
pub mod mapper;

pub const OPENCP_GROUP: &str = "opencp.io";
pub const OPENCP_VERSION: &str = "v1alpha1";

/// Static identity of a resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindDescriptor {
    pub kind: &'static str,
    pub list_kind: &'static str,
    /// Empty for the core group.
    pub group: &'static str,
    pub version: &'static str,
    pub plural: &'static str,
    pub singular: &'static str,
    pub namespaced: bool,
    pub short_names: &'static [&'static str],
    pub verbs: &'static [&'static str],
}

impl KindDescriptor {
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Root of the REST paths for this kind, e.g. `/apis/opencp.io/v1alpha1`.
    pub fn base_path(&self) -> String {
        if self.group.is_empty() {
            format!("/api/{}", self.version)
        } else {
            format!("/apis/{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> APIResource {
        APIResource {
            name: self.plural.to_string(),
            singular_name: self.singular.to_string(),
            namespaced: self.namespaced,
            kind: self.kind.to_string(),
            verbs: self.verbs.iter().map(|verb| verb.to_string()).collect(),
            short_names: self.short_names.iter().map(|s| s.to_string()).collect(),
            categories: None,
        }
    }
}

/// Bounds shared by every spec and status payload.
pub trait Payload:
    Serialize + DeserializeOwned + Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static
{
}

impl<T> Payload for T where
    T: Serialize + DeserializeOwned + Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static
{
}

pub type WireObject<K> =
    BackendObject<<K as ResourceKind>::WireSpec, <K as ResourceKind>::WireStatus>;
pub type ResourceOf<K> = Resource<<K as ResourceKind>::Spec, <K as ResourceKind>::Status>;

/// Name and namespace addressed by a request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTarget {
    pub namespace: Option<String>,
    pub name: Option<String>,
}

pub trait ResourceKind: Sized + Send + Sync + 'static {
    type WireSpec: Payload;
    type WireStatus: Payload;
    type Spec: Payload;
    type Status: Payload;

    fn descriptor() -> &'static KindDescriptor;

    /// Column definitions, declared once per kind.
    fn columns() -> Vec<TableColumnDefinition>;

    /// Cell values in column order.
    fn cells(resource: &ResourceOf<Self>, now: DateTime<Utc>) -> Vec<Value>;

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>>;

    fn bridge_spec(spec: &Self::WireSpec) -> Result<Self::Spec, mapper::MapError> {
        mapper::bridge(spec)
    }

    fn bridge_status(status: &Self::WireStatus) -> Result<Self::Status, mapper::MapError> {
        mapper::bridge(status)
    }

    fn unbridge_spec(spec: &Self::Spec) -> Result<Self::WireSpec, mapper::MapError> {
        mapper::bridge(spec)
    }

    fn unbridge_status(status: &Self::Status) -> Result<Self::WireStatus, mapper::MapError> {
        mapper::bridge(status)
    }

    /// Extracts the addressed object from matched path parameters.
    fn target(params: &HashMap<String, String>) -> RequestTarget {
        RequestTarget {
            namespace: params
                .get("namespace")
                .filter(|ns| !ns.is_empty())
                .cloned(),
            name: params.get("name").cloned(),
        }
    }
}

/// Descriptors of every served kind, core namespaces last.
pub fn descriptors() -> Vec<&'static KindDescriptor> {
    vec![
        &kinds::VIRTUAL_MACHINE,
        &kinds::KUBERNETES_CLUSTER,
        &kinds::FIREWALL,
        &kinds::DOMAIN,
        &kinds::SSH_KEY,
        &kinds::OBJECT_STORAGE,
        &kinds::OBJECT_STORAGE_CREDENTIAL,
        &kinds::DATABASE,
        &kinds::IP,
        &kinds::NAMESPACE,
    ]
}

/// Descriptors of the `opencp.io` group only.
pub fn opencp_descriptors() -> Vec<&'static KindDescriptor> {
    descriptors()
        .into_iter()
        .filter(|descriptor| descriptor.group == OPENCP_GROUP)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_ten_kinds_with_unique_plurals() {
        let all = descriptors();
        assert_eq!(all.len(), 10);
        let mut plurals: Vec<_> = all.iter().map(|d| d.plural).collect();
        plurals.sort_unstable();
        plurals.dedup();
        assert_eq!(plurals.len(), 10);
        assert_eq!(opencp_descriptors().len(), 9);
    }

    #[test]
    fn api_version_and_base_path_follow_group() {
        assert_eq!(kinds::FIREWALL.api_version(), "opencp.io/v1alpha1");
        assert_eq!(kinds::FIREWALL.base_path(), "/apis/opencp.io/v1alpha1");
        assert_eq!(kinds::NAMESPACE.api_version(), "v1");
        assert_eq!(kinds::NAMESPACE.base_path(), "/api/v1");
    }

    #[test]
    fn default_target_reads_name_and_namespace() {
        let mut params = HashMap::new();
        params.insert("namespace".to_string(), "dev".to_string());
        params.insert("name".to_string(), "web".to_string());
        let target = kinds::VirtualMachineKind::target(&params);
        assert_eq!(target.namespace.as_deref(), Some("dev"));
        assert_eq!(target.name.as_deref(), Some("web"));
    }

    #[test]
    fn namespace_kind_reads_its_name_from_namespace_segment() {
        let mut params = HashMap::new();
        params.insert("namespace".to_string(), "dev".to_string());
        let target = kinds::NamespaceKind::target(&params);
        assert_eq!(target.namespace, None);
        assert_eq!(target.name.as_deref(), Some("dev"));
    }
}
