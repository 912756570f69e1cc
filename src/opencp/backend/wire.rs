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

//! Request and response schema of the OpenCP control-plane services.
//!
//! These mirror the client-facing types field for field where the two overlap
//! and additionally carry backend bookkeeping (regions, network and account
//! identifiers) that is never exposed through the Kubernetes surface.

use serde::{Deserialize, Serialize};

use crate::opencp::k8s::meta::ObjectMeta;

/// A backend object as returned by the control plane. Any part may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "S: Serialize, T: Serialize",
    deserialize = "S: Deserialize<'de>, T: Deserialize<'de>"
))]
pub struct BackendObject<S, T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<S>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<T>,
}

impl<S, T> BackendObject<S, T> {
    pub fn new(metadata: ObjectMeta, spec: S, status: T) -> Self {
        BackendObject {
            metadata: Some(metadata),
            spec: Some(spec),
            status: Some(status),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(|meta| meta.name.as_deref())
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.namespace.as_deref())
            .filter(|ns| !ns.is_empty())
    }
}

impl<S, T> Default for BackendObject<S, T> {
    fn default() -> Self {
        BackendObject {
            metadata: None,
            spec: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineSpec {
    pub size: String,
    pub image: String,
    pub ipv4: bool,
    #[serde(rename = "userScript")]
    pub user_script: String,
    pub tags: Vec<String>,
    pub auth: VirtualMachineAuth,
    pub firewall: String,
    pub region: String,
    #[serde(rename = "networkId")]
    pub network_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineAuth {
    pub user: String,
    #[serde(rename = "sshKey")]
    pub ssh_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineStatus {
    pub state: String,
    #[serde(rename = "publicIP")]
    pub public_ip: String,
    #[serde(rename = "privateIP")]
    pub private_ip: String,
    #[serde(rename = "instanceId")]
    pub instance_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesClusterSpec {
    pub version: String,
    pub pools: Vec<NodePool>,
    pub firewall: String,
    #[serde(rename = "cniPlugin")]
    pub cni_plugin: String,
    pub region: String,
    #[serde(rename = "networkId")]
    pub network_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodePool {
    pub name: String,
    pub count: i32,
    pub size: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesClusterStatus {
    pub state: String,
    #[serde(rename = "publicIP")]
    pub public_ip: String,
    #[serde(rename = "masterId")]
    pub master_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallSpec {
    pub rules: Vec<FirewallRule>,
    #[serde(rename = "networkId")]
    pub network_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallRule {
    pub protocol: String,
    #[serde(rename = "startPort")]
    pub start_port: i32,
    #[serde(rename = "endPort")]
    pub end_port: i32,
    pub cidr: Vec<String>,
    pub direction: String,
    pub action: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallStatus {
    pub state: String,
    #[serde(rename = "totalRules")]
    pub total_rules: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainSpec {
    pub records: Vec<DomainRecord>,
    #[serde(rename = "accountId")]
    pub account_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub ttl: i32,
    pub priority: Option<i32>,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainStatus {
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshKeySpec {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "accountId")]
    pub account_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshKeyStatus {
    pub state: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageSpec {
    pub size: i64,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageStatus {
    pub state: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageCredentialSpec {
    pub accesskey: String,
    pub suspended: bool,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageCredentialStatus {
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSpec {
    pub nodes: i32,
    pub size: String,
    pub engine: String,
    #[serde(rename = "engineVersion")]
    pub engine_version: String,
    pub firewall: String,
    pub region: String,
    #[serde(rename = "networkId")]
    pub network_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseStatus {
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpSpec {
    #[serde(rename = "reverseDNS")]
    pub reverse_dns: String,
    pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpStatus {
    pub ip: String,
    pub assignedto: IpAssignment,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpAssignment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSpec {
    pub finalizers: Vec<String>,
    #[serde(rename = "accountId")]
    pub account_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceStatus {
    pub phase: String,
}
