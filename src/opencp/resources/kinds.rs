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

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::{KindDescriptor, RequestTarget, ResourceKind, ResourceOf, OPENCP_GROUP, OPENCP_VERSION};
use crate::opencp::api::core_v1::{NamespaceSpec, NamespaceStatus};
use crate::opencp::api::v1alpha1 as api;
use crate::opencp::backend::{wire, Backends, ResourceBackend};
use crate::opencp::k8s::table::{format_age, TableColumnDefinition as Column};

const CRUD_VERBS: &[&str] = &["create", "delete", "get", "list"];

pub static VIRTUAL_MACHINE: KindDescriptor = KindDescriptor {
    kind: "VirtualMachine",
    list_kind: "VirtualMachineList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "virtualmachines",
    singular: "virtualmachine",
    namespaced: true,
    short_names: &["vm"],
    verbs: CRUD_VERBS,
};

pub static KUBERNETES_CLUSTER: KindDescriptor = KindDescriptor {
    kind: "KubernetesCluster",
    list_kind: "KubernetesClusterList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "kubernetesclusters",
    singular: "kubernetescluster",
    namespaced: true,
    short_names: &["kc"],
    verbs: CRUD_VERBS,
};

pub static FIREWALL: KindDescriptor = KindDescriptor {
    kind: "Firewall",
    list_kind: "FirewallList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "firewalls",
    singular: "firewall",
    namespaced: true,
    short_names: &["fw"],
    verbs: CRUD_VERBS,
};

pub static DATABASE: KindDescriptor = KindDescriptor {
    kind: "Database",
    list_kind: "DatabaseList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "databases",
    singular: "database",
    namespaced: true,
    short_names: &["db"],
    verbs: CRUD_VERBS,
};

pub static DOMAIN: KindDescriptor = KindDescriptor {
    kind: "Domain",
    list_kind: "DomainList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "domains",
    singular: "domain",
    namespaced: false,
    short_names: &[],
    verbs: CRUD_VERBS,
};

pub static SSH_KEY: KindDescriptor = KindDescriptor {
    kind: "SSHKey",
    list_kind: "SSHKeyList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "sshkeys",
    singular: "sshkey",
    namespaced: false,
    short_names: &[],
    verbs: CRUD_VERBS,
};

pub static OBJECT_STORAGE: KindDescriptor = KindDescriptor {
    kind: "ObjectStorage",
    list_kind: "ObjectStorageList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "objectstorages",
    singular: "objectstorage",
    namespaced: false,
    short_names: &["os"],
    verbs: CRUD_VERBS,
};

pub static OBJECT_STORAGE_CREDENTIAL: KindDescriptor = KindDescriptor {
    kind: "ObjectStorageCredential",
    list_kind: "ObjectStorageCredentialList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "objectstoragecredentials",
    singular: "objectstoragecredential",
    namespaced: false,
    short_names: &["osc"],
    verbs: CRUD_VERBS,
};

pub static IP: KindDescriptor = KindDescriptor {
    kind: "IP",
    list_kind: "IPList",
    group: OPENCP_GROUP,
    version: OPENCP_VERSION,
    plural: "ips",
    singular: "ip",
    namespaced: false,
    short_names: &[],
    verbs: CRUD_VERBS,
};

pub static NAMESPACE: KindDescriptor = KindDescriptor {
    kind: "Namespace",
    list_kind: "NamespaceList",
    group: "",
    version: "v1",
    plural: "namespaces",
    singular: "",
    namespaced: false,
    short_names: &["ns"],
    verbs: CRUD_VERBS,
};

fn name_cell<S, T>(resource: &crate::opencp::api::Resource<S, T>) -> Value {
    json!(resource.metadata.name_str())
}

fn uid_cell<S, T>(resource: &crate::opencp::api::Resource<S, T>) -> Value {
    json!(resource.metadata.uid_str())
}

fn uid_column() -> Column {
    Column::string("UID", "Unique identifier assigned by the control plane")
}

fn age_cell(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Value {
    match created {
        Some(created) => json!(format_age(created, now)),
        None => json!("<unknown>"),
    }
}

pub struct VirtualMachineKind;

impl ResourceKind for VirtualMachineKind {
    type WireSpec = wire::VirtualMachineSpec;
    type WireStatus = wire::VirtualMachineStatus;
    type Spec = api::VirtualMachineSpec;
    type Status = api::VirtualMachineStatus;

    fn descriptor() -> &'static KindDescriptor {
        &VIRTUAL_MACHINE
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Hostname", "Hostname of the virtual machine"),
            uid_column(),
            Column::string("Size", "Instance size"),
            Column::string("Public IP", "Public IPv4 address"),
            Column::string("Private IP", "Private network address"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(vm: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(vm),
            uid_cell(vm),
            json!(vm.spec.size),
            json!(vm.status.public_ip),
            json!(vm.status.private_ip),
            json!(vm.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.virtual_machines
    }
}

pub struct KubernetesClusterKind;

impl ResourceKind for KubernetesClusterKind {
    type WireSpec = wire::KubernetesClusterSpec;
    type WireStatus = wire::KubernetesClusterStatus;
    type Spec = api::KubernetesClusterSpec;
    type Status = api::KubernetesClusterStatus;

    fn descriptor() -> &'static KindDescriptor {
        &KUBERNETES_CLUSTER
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Cluster name"),
            uid_column(),
            Column::integer("Pools", "Number of node pools"),
            Column::string("Public IP", "API endpoint address"),
            Column::string("State", "Lifecycle state reported by the control plane"),
            Column::string("Age", "Time since the cluster was created"),
        ]
    }

    fn cells(cluster: &ResourceOf<Self>, now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(cluster),
            uid_cell(cluster),
            json!(cluster.spec.pools.len()),
            json!(cluster.status.public_ip),
            json!(cluster.status.state),
            age_cell(cluster.metadata.creation_timestamp, now),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.kubernetes_clusters
    }
}

pub struct FirewallKind;

impl ResourceKind for FirewallKind {
    type WireSpec = wire::FirewallSpec;
    type WireStatus = wire::FirewallStatus;
    type Spec = api::FirewallSpec;
    type Status = api::FirewallStatus;

    fn descriptor() -> &'static KindDescriptor {
        &FIREWALL
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Firewall name"),
            uid_column(),
            Column::integer("Total rules", "Number of rules attached"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(firewall: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(firewall),
            uid_cell(firewall),
            json!(firewall.status.total_rules),
            json!(firewall.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.firewalls
    }
}

pub struct DatabaseKind;

impl ResourceKind for DatabaseKind {
    type WireSpec = wire::DatabaseSpec;
    type WireStatus = wire::DatabaseStatus;
    type Spec = api::DatabaseSpec;
    type Status = api::DatabaseStatus;

    fn descriptor() -> &'static KindDescriptor {
        &DATABASE
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Database name"),
            uid_column(),
            Column::integer("Nodes", "Number of database nodes"),
            Column::string("Size", "Node size"),
            Column::string("Engine", "Database engine"),
            Column::string("Engine Version", "Database engine version"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(db: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(db),
            uid_cell(db),
            json!(db.spec.nodes),
            json!(db.spec.size),
            json!(db.spec.engine),
            json!(db.spec.engine_version),
            json!(db.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.databases
    }
}

pub struct DomainKind;

impl ResourceKind for DomainKind {
    type WireSpec = wire::DomainSpec;
    type WireStatus = wire::DomainStatus;
    type Spec = api::DomainSpec;
    type Status = api::DomainStatus;

    fn descriptor() -> &'static KindDescriptor {
        &DOMAIN
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Domain name"),
            uid_column(),
            Column::integer("Total records", "Number of DNS records"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(domain: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(domain),
            uid_cell(domain),
            json!(domain.spec.records.len()),
            json!(domain.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.domains
    }
}

pub struct SshKeyKind;

impl ResourceKind for SshKeyKind {
    type WireSpec = wire::SshKeySpec;
    type WireStatus = wire::SshKeyStatus;
    type Spec = api::SshKeySpec;
    type Status = api::SshKeyStatus;

    fn descriptor() -> &'static KindDescriptor {
        &SSH_KEY
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "SSH key name"),
            uid_column(),
            Column::date_time("Created", "Creation timestamp"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(key: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        let created = key
            .metadata
            .creation_timestamp
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        vec![
            name_cell(key),
            uid_cell(key),
            json!(created),
            json!(key.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.ssh_keys
    }
}

pub struct ObjectStorageKind;

impl ResourceKind for ObjectStorageKind {
    type WireSpec = wire::ObjectStorageSpec;
    type WireStatus = wire::ObjectStorageStatus;
    type Spec = api::ObjectStorageSpec;
    type Status = api::ObjectStorageStatus;

    fn descriptor() -> &'static KindDescriptor {
        &OBJECT_STORAGE
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Bucket name"),
            uid_column(),
            Column::integer("Size", "Quota in gigabytes"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(bucket: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(bucket),
            uid_cell(bucket),
            json!(bucket.spec.size),
            json!(bucket.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.object_storages
    }
}

pub struct ObjectStorageCredentialKind;

impl ResourceKind for ObjectStorageCredentialKind {
    type WireSpec = wire::ObjectStorageCredentialSpec;
    type WireStatus = wire::ObjectStorageCredentialStatus;
    type Spec = api::ObjectStorageCredentialSpec;
    type Status = api::ObjectStorageCredentialStatus;

    fn descriptor() -> &'static KindDescriptor {
        &OBJECT_STORAGE_CREDENTIAL
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Credential name"),
            uid_column(),
            Column::string("Access Key", "Access key identifier"),
            Column::string("Status", "Lifecycle state reported by the control plane"),
        ]
    }

    fn cells(credential: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(credential),
            uid_cell(credential),
            json!(credential.spec.accesskey),
            json!(credential.status.state),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.object_storage_credentials
    }
}

pub struct IpKind;

impl ResourceKind for IpKind {
    type WireSpec = wire::IpSpec;
    type WireStatus = wire::IpStatus;
    type Spec = api::IpSpec;
    type Status = api::IpStatus;

    fn descriptor() -> &'static KindDescriptor {
        &IP
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Reserved IP name"),
            uid_column(),
            Column::string("IP", "Address"),
            Column::string("Assigned to", "Name of the resource holding the address"),
            Column::string("Type", "Kind of the resource holding the address"),
        ]
    }

    fn cells(ip: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(ip),
            uid_cell(ip),
            json!(ip.status.ip),
            json!(ip.status.assignedto.name),
            json!(ip.status.assignedto.target_type),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.ips
    }
}

pub struct NamespaceKind;

impl ResourceKind for NamespaceKind {
    type WireSpec = wire::NamespaceSpec;
    type WireStatus = wire::NamespaceStatus;
    type Spec = NamespaceSpec;
    type Status = NamespaceStatus;

    fn descriptor() -> &'static KindDescriptor {
        &NAMESPACE
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::name("Name", "Namespace name"),
            uid_column(),
            Column::string("State", "Namespace phase"),
        ]
    }

    fn cells(namespace: &ResourceOf<Self>, _now: DateTime<Utc>) -> Vec<Value> {
        vec![
            name_cell(namespace),
            uid_cell(namespace),
            json!(namespace.status.phase),
        ]
    }

    fn backend(backends: &Backends) -> &Arc<dyn ResourceBackend<Self>> {
        &backends.namespaces
    }

    // `/api/v1/namespaces/{namespace}` names the namespace itself.
    fn target(params: &HashMap<String, String>) -> RequestTarget {
        RequestTarget {
            namespace: None,
            name: params.get("namespace").cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opencp::k8s::meta::ObjectMeta;
    use crate::opencp::resources::mapper::to_resource;
    use chrono::Duration;

    #[test]
    fn cluster_cells_count_pools_and_age() {
        let now = Utc::now();
        let mut meta = ObjectMeta::named("prod");
        meta.creation_timestamp = Some(now - Duration::hours(5));
        let object = crate::opencp::resources::WireObject::<KubernetesClusterKind>::new(
            meta,
            wire::KubernetesClusterSpec {
                pools: vec![wire::NodePool::default(), wire::NodePool::default()],
                ..Default::default()
            },
            wire::KubernetesClusterStatus {
                state: "ACTIVE".into(),
                public_ip: "203.0.113.9".into(),
                master_id: "m-1".into(),
            },
        );
        let cluster = to_resource::<KubernetesClusterKind>(&object).unwrap();
        let cells = KubernetesClusterKind::cells(&cluster, now);
        assert_eq!(cells.len(), KubernetesClusterKind::columns().len());
        assert_eq!(cells[2], json!(2));
        assert_eq!(cells[3], json!("203.0.113.9"));
        assert_eq!(cells[5], json!("5h"));

        let age = &KubernetesClusterKind::columns()[5];
        assert_eq!(age.name, "Age");
        assert_eq!(age.type_name, "string");
        assert_eq!(age.format, None);
    }

    #[test]
    fn ip_cells_read_assignment() {
        let object = crate::opencp::resources::WireObject::<IpKind>::new(
            ObjectMeta::named("edge-ip"),
            wire::IpSpec::default(),
            wire::IpStatus {
                ip: "198.51.100.4".into(),
                assignedto: wire::IpAssignment {
                    id: "i-1".into(),
                    name: "web-1".into(),
                    target_type: "instance".into(),
                },
            },
        );
        let ip = to_resource::<IpKind>(&object).unwrap();
        let cells = IpKind::cells(&ip, Utc::now());
        assert_eq!(cells[2], json!("198.51.100.4"));
        assert_eq!(cells[3], json!("web-1"));
        assert_eq!(cells[4], json!("instance"));
    }

    #[test]
    fn every_kind_starts_with_a_name_column() {
        let first_columns = [
            VirtualMachineKind::columns().remove(0),
            KubernetesClusterKind::columns().remove(0),
            FirewallKind::columns().remove(0),
            DatabaseKind::columns().remove(0),
            DomainKind::columns().remove(0),
            SshKeyKind::columns().remove(0),
            ObjectStorageKind::columns().remove(0),
            ObjectStorageCredentialKind::columns().remove(0),
            IpKind::columns().remove(0),
            NamespaceKind::columns().remove(0),
        ];
        for column in first_columns {
            assert_eq!(column.format.as_deref(), Some("name"), "{}", column.name);
        }
    }
}
