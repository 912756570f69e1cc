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

use serde::{Deserialize, Serialize};

use super::Resource;

pub type VirtualMachine = Resource<VirtualMachineSpec, VirtualMachineStatus>;
pub type KubernetesCluster = Resource<KubernetesClusterSpec, KubernetesClusterStatus>;
pub type Firewall = Resource<FirewallSpec, FirewallStatus>;
pub type Domain = Resource<DomainSpec, DomainStatus>;
pub type SshKey = Resource<SshKeySpec, SshKeyStatus>;
pub type ObjectStorage = Resource<ObjectStorageSpec, ObjectStorageStatus>;
pub type ObjectStorageCredential =
    Resource<ObjectStorageCredentialSpec, ObjectStorageCredentialStatus>;
pub type Database = Resource<DatabaseSpec, DatabaseStatus>;
pub type Ip = Resource<IpSpec, IpStatus>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualMachineSpec {
    pub size: String,
    pub image: String,
    pub ipv4: bool,
    #[serde(rename = "userScript", skip_serializing_if = "String::is_empty")]
    pub user_script: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub auth: VirtualMachineAuth,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub firewall: String,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesClusterSpec {
    pub version: String,
    pub pools: Vec<NodePool>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub firewall: String,
    #[serde(rename = "cniPlugin", skip_serializing_if = "String::is_empty")]
    pub cni_plugin: String,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallSpec {
    pub rules: Vec<FirewallRule>,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainRecord {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub value: String,
    pub ttl: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
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
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshKeyStatus {
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fingerprint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageSpec {
    /// Bucket quota in gigabytes.
    pub size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageStatus {
    pub state: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageCredentialSpec {
    pub accesskey: String,
    pub suspended: bool,
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
    #[serde(skip_serializing_if = "String::is_empty")]
    pub firewall: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseStatus {
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpSpec {
    #[serde(rename = "reverseDNS", skip_serializing_if = "String::is_empty")]
    pub reverse_dns: String,
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
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub target_type: String,
}
