use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};

use opencp::opencp::api::{core_v1, v1alpha1};
use opencp::opencp::backend::wire::{self, BackendObject};
use opencp::opencp::k8s::meta::ObjectMeta;
use opencp::opencp::resources::kinds::{
    DatabaseKind, DomainKind, FirewallKind, IpKind, KubernetesClusterKind, NamespaceKind,
    ObjectStorageCredentialKind, ObjectStorageKind, SshKeyKind, VirtualMachineKind,
};
use opencp::opencp::resources::{mapper, ResourceKind};

/// Parts of `value` addressed by the keys present in `shape`.
fn overlap(value: &Value, shape: &Value) -> Value {
    match (value, shape) {
        (Value::Object(fields), Value::Object(keys)) => Value::Object(
            keys.iter()
                .filter_map(|(key, inner)| {
                    fields
                        .get(key)
                        .map(|field| (key.clone(), overlap(field, inner)))
                })
                .collect(),
        ),
        (Value::Array(items), Value::Array(shapes)) => Value::Array(
            items
                .iter()
                .zip(shapes)
                .map(|(item, inner)| overlap(item, inner))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Serves the object and converts it back, checking that metadata and every
/// field shared by both schemas survive unchanged.
fn assert_envelope_round_trip<K: ResourceKind>(spec: K::WireSpec, status: K::WireStatus) {
    let mut metadata = ObjectMeta::named("sample");
    metadata.namespace = Some("dev".to_string());
    metadata.uid = Some("uid-7".to_string());
    metadata.creation_timestamp = Some(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    let object = BackendObject::new(metadata, spec, status);

    let resource = mapper::to_resource::<K>(&object).unwrap();
    let back = mapper::to_backend::<K>(&resource).unwrap();
    assert_eq!(back.metadata, object.metadata);

    let served = serde_json::to_value(&resource).unwrap();
    for (part, original, returned) in [
        (
            "spec",
            serde_json::to_value(&object.spec).unwrap(),
            serde_json::to_value(&back.spec).unwrap(),
        ),
        (
            "status",
            serde_json::to_value(&object.status).unwrap(),
            serde_json::to_value(&back.status).unwrap(),
        ),
    ] {
        let shared = overlap(&original, &served[part]);
        assert_ne!(shared, json!({}), "{} {part} shares no fields", K::descriptor().kind);
        assert_eq!(
            overlap(&returned, &served[part]),
            shared,
            "{} {part}",
            K::descriptor().kind
        );
    }
}

#[test]
fn every_kind_round_trips_its_envelope() {
    assert_envelope_round_trip::<VirtualMachineKind>(
        wire::VirtualMachineSpec {
            size: "g3.large".to_string(),
            image: "ubuntu-24.04".to_string(),
            ipv4: true,
            tags: vec!["web".to_string(), "prod".to_string()],
            region: "LON1".to_string(),
            network_id: "net-1".to_string(),
            ..Default::default()
        },
        wire::VirtualMachineStatus {
            state: "ACTIVE".to_string(),
            public_ip: "198.51.100.10".to_string(),
            private_ip: "10.0.0.4".to_string(),
            instance_id: "i-1".to_string(),
        },
    );
    assert_envelope_round_trip::<KubernetesClusterKind>(
        wire::KubernetesClusterSpec {
            version: "1.29".to_string(),
            pools: vec![wire::NodePool {
                name: "default".to_string(),
                count: 2,
                size: "g4s.kube.small".to_string(),
            }],
            firewall: "fw-1".to_string(),
            cni_plugin: "cilium".to_string(),
            region: "NYC1".to_string(),
            network_id: "net-2".to_string(),
        },
        wire::KubernetesClusterStatus {
            state: "ACTIVE".to_string(),
            public_ip: "192.0.2.8".to_string(),
            master_id: "m-1".to_string(),
        },
    );
    assert_envelope_round_trip::<FirewallKind>(
        wire::FirewallSpec {
            rules: vec![wire::FirewallRule {
                protocol: "tcp".to_string(),
                start_port: 22,
                end_port: 22,
                cidr: vec!["10.0.0.0/8".to_string()],
                direction: "ingress".to_string(),
                action: "allow".to_string(),
                id: "rule-1".to_string(),
            }],
            network_id: "net-1".to_string(),
        },
        wire::FirewallStatus {
            state: "ACTIVE".to_string(),
            total_rules: 1,
        },
    );
    assert_envelope_round_trip::<DomainKind>(
        wire::DomainSpec {
            records: vec![wire::DomainRecord {
                record_type: "A".to_string(),
                name: "www".to_string(),
                value: "198.51.100.10".to_string(),
                ttl: 600,
                priority: Some(5),
                id: "rec-1".to_string(),
            }],
            account_id: "acc-1".to_string(),
        },
        wire::DomainStatus {
            state: "ACTIVE".to_string(),
        },
    );
    assert_envelope_round_trip::<SshKeyKind>(
        wire::SshKeySpec {
            public_key: "ssh-ed25519 AAAA".to_string(),
            account_id: "acc-1".to_string(),
        },
        wire::SshKeyStatus {
            state: "ACTIVE".to_string(),
            fingerprint: "SHA256:abc".to_string(),
        },
    );
    assert_envelope_round_trip::<ObjectStorageKind>(
        wire::ObjectStorageSpec {
            size: 500,
            region: "LON1".to_string(),
        },
        wire::ObjectStorageStatus {
            state: "READY".to_string(),
            endpoint: "objectstore.lon1.example".to_string(),
        },
    );
    assert_envelope_round_trip::<ObjectStorageCredentialKind>(
        wire::ObjectStorageCredentialSpec {
            accesskey: "AKIA123".to_string(),
            suspended: true,
            region: "LON1".to_string(),
        },
        wire::ObjectStorageCredentialStatus {
            state: "READY".to_string(),
        },
    );
    assert_envelope_round_trip::<DatabaseKind>(
        wire::DatabaseSpec {
            nodes: 3,
            size: "g3.db.small".to_string(),
            engine: "postgres".to_string(),
            engine_version: "16".to_string(),
            firewall: "fw-db".to_string(),
            region: "FRA1".to_string(),
            network_id: "net-3".to_string(),
        },
        wire::DatabaseStatus {
            state: "READY".to_string(),
        },
    );
    assert_envelope_round_trip::<IpKind>(
        wire::IpSpec {
            reverse_dns: "host.example.com".to_string(),
            region: "LON1".to_string(),
        },
        wire::IpStatus {
            ip: "203.0.113.5".to_string(),
            assignedto: wire::IpAssignment {
                id: "vm-1".to_string(),
                name: "web".to_string(),
                target_type: "instance".to_string(),
            },
        },
    );
    assert_envelope_round_trip::<NamespaceKind>(
        wire::NamespaceSpec {
            finalizers: vec!["kubernetes".to_string()],
            account_id: "acc-1".to_string(),
        },
        wire::NamespaceStatus {
            phase: "Active".to_string(),
        },
    );
}

#[test]
fn virtual_machine_drops_backend_bookkeeping() {
    let wire_spec = wire::VirtualMachineSpec {
        size: "g3.medium".to_string(),
        image: "debian-12".to_string(),
        ipv4: true,
        tags: vec!["web".to_string()],
        region: "LON1".to_string(),
        network_id: "net-1".to_string(),
        ..Default::default()
    };
    let spec = VirtualMachineKind::bridge_spec(&wire_spec).unwrap();
    assert_eq!(spec.size, "g3.medium");
    assert!(spec.ipv4);
    assert_eq!(spec.tags, ["web"]);

    let back = VirtualMachineKind::unbridge_spec(&spec).unwrap();
    assert_eq!(back.region, "");
    assert_eq!(back.network_id, "");
    assert_eq!(back.image, "debian-12");

    let status = VirtualMachineKind::bridge_status(&wire::VirtualMachineStatus {
        state: "ACTIVE".to_string(),
        public_ip: "198.51.100.10".to_string(),
        instance_id: "i-123".to_string(),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        status,
        v1alpha1::VirtualMachineStatus {
            state: "ACTIVE".to_string(),
            public_ip: "198.51.100.10".to_string(),
            private_ip: String::new(),
        }
    );
}

#[test]
fn kubernetes_cluster_keeps_pools() {
    let spec = KubernetesClusterKind::bridge_spec(&wire::KubernetesClusterSpec {
        version: "1.28".to_string(),
        pools: vec![wire::NodePool {
            name: "default".to_string(),
            count: 3,
            size: "g4s.kube.medium".to_string(),
        }],
        region: "NYC1".to_string(),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(spec.pools.len(), 1);
    assert_eq!(spec.pools[0].count, 3);

    let status = KubernetesClusterKind::bridge_status(&wire::KubernetesClusterStatus {
        state: "ACTIVE".to_string(),
        master_id: "m-1".to_string(),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(status.state, "ACTIVE");
}

#[test]
fn firewall_rules_lose_backend_ids() {
    let spec = FirewallKind::bridge_spec(&wire::FirewallSpec {
        rules: vec![wire::FirewallRule {
            protocol: "tcp".to_string(),
            start_port: 443,
            end_port: 443,
            cidr: vec!["0.0.0.0/0".to_string()],
            direction: "ingress".to_string(),
            action: "allow".to_string(),
            id: "rule-9".to_string(),
        }],
        network_id: "net-1".to_string(),
    })
    .unwrap();
    assert_eq!(spec.rules[0].start_port, 443);

    let back = FirewallKind::unbridge_spec(&spec).unwrap();
    assert_eq!(back.rules[0].id, "");
    assert_eq!(back.rules[0].cidr, ["0.0.0.0/0"]);

    let status = FirewallKind::bridge_status(&wire::FirewallStatus {
        state: "ACTIVE".to_string(),
        total_rules: 1,
    })
    .unwrap();
    assert_eq!(status.total_rules, 1);
}

#[test]
fn database_and_object_storage_round_trip_their_shared_fields() {
    let db = DatabaseKind::bridge_spec(&wire::DatabaseSpec {
        nodes: 3,
        size: "g3.db.small".to_string(),
        engine: "postgres".to_string(),
        engine_version: "16".to_string(),
        region: "FRA1".to_string(),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(db.engine_version, "16");
    assert_eq!(DatabaseKind::unbridge_spec(&db).unwrap().region, "");

    let storage = ObjectStorageKind::bridge_spec(&wire::ObjectStorageSpec {
        size: 500,
        region: "LON1".to_string(),
    })
    .unwrap();
    assert_eq!(storage.size, 500);

    let credential = ObjectStorageCredentialKind::bridge_spec(&wire::ObjectStorageCredentialSpec {
        accesskey: "AKIA123".to_string(),
        suspended: true,
        region: "LON1".to_string(),
    })
    .unwrap();
    assert_eq!(credential.accesskey, "AKIA123");
    assert!(credential.suspended);
}

#[test]
fn domain_records_and_ssh_keys() {
    let domain = DomainKind::bridge_spec(&wire::DomainSpec {
        records: vec![wire::DomainRecord {
            record_type: "MX".to_string(),
            name: "@".to_string(),
            value: "mail.example.com".to_string(),
            ttl: 3600,
            priority: Some(10),
            id: "rec-1".to_string(),
        }],
        account_id: "acc-1".to_string(),
    })
    .unwrap();
    assert_eq!(domain.records[0].record_type, "MX");
    assert_eq!(domain.records[0].priority, Some(10));

    let key = SshKeyKind::bridge_spec(&wire::SshKeySpec {
        public_key: "ssh-ed25519 AAAA".to_string(),
        account_id: "acc-1".to_string(),
    })
    .unwrap();
    assert_eq!(key.public_key, "ssh-ed25519 AAAA");

    let key_status = SshKeyKind::bridge_status(&wire::SshKeyStatus {
        state: "ACTIVE".to_string(),
        fingerprint: "SHA256:abc".to_string(),
    })
    .unwrap();
    assert_eq!(key_status.fingerprint, "SHA256:abc");
}

#[test]
fn ip_assignment_and_namespace_phase() {
    let ip = IpKind::bridge_status(&wire::IpStatus {
        ip: "203.0.113.5".to_string(),
        assignedto: wire::IpAssignment {
            id: "vm-1".to_string(),
            name: "web".to_string(),
            target_type: "instance".to_string(),
        },
    })
    .unwrap();
    assert_eq!(ip.assignedto.name, "web");
    assert_eq!(ip.assignedto.target_type, "instance");

    let namespace = NamespaceKind::bridge_status(&wire::NamespaceStatus {
        phase: "Active".to_string(),
    })
    .unwrap();
    assert_eq!(
        namespace,
        core_v1::NamespaceStatus {
            phase: "Active".to_string()
        }
    );
}

#[test]
fn cluster_rows_report_age_with_the_largest_unit() {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let object: BackendObject<wire::KubernetesClusterSpec, wire::KubernetesClusterStatus> =
        serde_json::from_value(json!({
            "metadata": {
                "name": "prod",
                "namespace": "dev",
                "uid": "c-1",
                "creationTimestamp": created.to_rfc3339()
            },
            "spec": { "pools": [{ "name": "a" }, { "name": "b" }] },
            "status": { "state": "ACTIVE", "publicIP": "192.0.2.8" }
        }))
        .unwrap();

    let table = mapper::to_table::<KubernetesClusterKind>(&[object], created + Duration::hours(50));
    let cells = &table.rows[0].cells;
    assert_eq!(cells[0], "prod");
    assert_eq!(cells[2], 2);
    assert_eq!(cells[3], "192.0.2.8");
    assert_eq!(cells[5], "2d");
}

#[test]
fn list_conversion_keeps_one_entry_per_backend_item() {
    let complete = BackendObject::new(
        ObjectMeta::named("web"),
        wire::VirtualMachineSpec::default(),
        wire::VirtualMachineStatus::default(),
    );
    let incomplete = BackendObject {
        metadata: Some(ObjectMeta::named("broken")),
        spec: None,
        status: None,
    };
    let list = mapper::to_list::<VirtualMachineKind>(&[complete, incomplete]);
    assert_eq!(list.kind, "VirtualMachineList");
    assert_eq!(list.items.len(), 2);
    assert_eq!(list.items[1].metadata.name_str(), "broken");
    assert_eq!(list.items[1].spec, v1alpha1::VirtualMachineSpec::default());
}
