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

//! Swagger 2.0 description of the served API, generated from the kind
//! registry.

use serde_json::{json, Map, Value};

use crate::opencp::resources::kinds::{
    DatabaseKind, DomainKind, FirewallKind, IpKind, KubernetesClusterKind, NamespaceKind,
    ObjectStorageCredentialKind, ObjectStorageKind, SshKeyKind, VirtualMachineKind,
};
use crate::opencp::resources::{KindDescriptor, ResourceKind};

const OBJECT_META_REF: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ObjectMeta";
const LIST_META_REF: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.ListMeta";
const STATUS_REF: &str = "io.k8s.apimachinery.pkg.apis.meta.v1.Status";

/// A kind together with sample payloads used to infer its schema.
#[derive(Clone, Debug)]
pub struct DocumentKind {
    pub descriptor: &'static KindDescriptor,
    pub spec: Value,
    pub status: Value,
}

pub fn document_kind<K: ResourceKind>() -> DocumentKind {
    DocumentKind {
        descriptor: K::descriptor(),
        spec: serde_json::to_value(K::Spec::default()).unwrap_or(Value::Null),
        status: serde_json::to_value(K::Status::default()).unwrap_or(Value::Null),
    }
}

pub fn registry_kinds() -> Vec<DocumentKind> {
    vec![
        document_kind::<VirtualMachineKind>(),
        document_kind::<KubernetesClusterKind>(),
        document_kind::<FirewallKind>(),
        document_kind::<DomainKind>(),
        document_kind::<SshKeyKind>(),
        document_kind::<ObjectStorageKind>(),
        document_kind::<ObjectStorageCredentialKind>(),
        document_kind::<DatabaseKind>(),
        document_kind::<IpKind>(),
        document_kind::<NamespaceKind>(),
    ]
}

/// Document covering every registered kind.
pub fn registry_document() -> Value {
    build_document(&registry_kinds())
}

pub fn build_document(kinds: &[DocumentKind]) -> Value {
    let mut paths = Map::new();
    let mut definitions = Map::new();
    definitions.insert(OBJECT_META_REF.to_string(), object_meta_schema());
    definitions.insert(LIST_META_REF.to_string(), list_meta_schema());
    definitions.insert(STATUS_REF.to_string(), status_schema());

    for kind in kinds {
        let descriptor = kind.descriptor;
        definitions.insert(definition_name(descriptor), resource_schema(kind));
        definitions.insert(
            format!("{}List", definition_name(descriptor)),
            list_schema(descriptor),
        );
        for (path, item) in kind_paths(descriptor) {
            paths.insert(path, item);
        }
    }

    json!({
        "swagger": "2.0",
        "info": {
            "title": "Open Controll Plane API",
            "description": "Resource for managing all resources in the provider",
            "contact": {
                "name": "OpenCP",
                "email": "hello@opencp.io",
                "url": "https://www.opencp.io"
            },
            "version": "v1.0.0"
        },
        "tags": [
            {"name": "opencp", "description": "Managing resources for OpenCP"}
        ],
        "paths": paths,
        "definitions": definitions,
    })
}

fn definition_name(descriptor: &KindDescriptor) -> String {
    if descriptor.group.is_empty() {
        format!("io.k8s.api.core.{}.{}", descriptor.version, descriptor.kind)
    } else {
        let reversed: Vec<&str> = descriptor.group.split('.').rev().collect();
        format!(
            "{}.{}.{}",
            reversed.join("."),
            descriptor.version,
            descriptor.kind
        )
    }
}

fn reference(name: &str) -> Value {
    json!({"$ref": format!("#/definitions/{name}")})
}

/// Infers a schema from a sample value. Empty arrays and nulls yield an
/// unconstrained schema.
fn schema_of(value: &Value) -> Value {
    match value {
        Value::Null => json!({}),
        Value::Bool(_) => json!({"type": "boolean"}),
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            json!({"type": "integer", "format": "int64"})
        }
        Value::Number(_) => json!({"type": "number", "format": "double"}),
        Value::String(_) => json!({"type": "string"}),
        Value::Array(items) => json!({
            "type": "array",
            "items": items.first().map(schema_of).unwrap_or_else(|| json!({})),
        }),
        Value::Object(fields) => {
            let properties: Map<String, Value> = fields
                .iter()
                .map(|(name, value)| (name.clone(), schema_of(value)))
                .collect();
            json!({"type": "object", "properties": properties})
        }
    }
}

fn group_version_kind(descriptor: &KindDescriptor, kind: &str) -> Value {
    json!([{
        "group": descriptor.group,
        "version": descriptor.version,
        "kind": kind,
    }])
}

fn resource_schema(kind: &DocumentKind) -> Value {
    let descriptor = kind.descriptor;
    json!({
        "type": "object",
        "properties": {
            "apiVersion": {"type": "string"},
            "kind": {"type": "string"},
            "metadata": reference(OBJECT_META_REF),
            "spec": schema_of(&kind.spec),
            "status": schema_of(&kind.status),
        },
        "x-kubernetes-group-version-kind": group_version_kind(descriptor, descriptor.kind),
    })
}

fn list_schema(descriptor: &KindDescriptor) -> Value {
    json!({
        "type": "object",
        "required": ["items"],
        "properties": {
            "apiVersion": {"type": "string"},
            "kind": {"type": "string"},
            "metadata": reference(LIST_META_REF),
            "items": {"type": "array", "items": reference(&definition_name(descriptor))},
        },
        "x-kubernetes-group-version-kind": group_version_kind(descriptor, descriptor.list_kind),
    })
}

fn object_meta_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "namespace": {"type": "string"},
            "uid": {"type": "string"},
            "creationTimestamp": {"type": "string", "format": "date-time"},
            "resourceVersion": {"type": "string"},
            "labels": {"type": "object", "additionalProperties": {"type": "string"}},
            "annotations": {"type": "object", "additionalProperties": {"type": "string"}},
        }
    })
}

fn list_meta_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "resourceVersion": {"type": "string"},
            "continue": {"type": "string"},
        }
    })
}

fn status_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "apiVersion": {"type": "string"},
            "kind": {"type": "string"},
            "status": {"type": "string"},
            "message": {"type": "string"},
            "reason": {"type": "string"},
            "code": {"type": "integer", "format": "int32"},
            "details": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "group": {"type": "string"},
                    "kind": {"type": "string"},
                    "uid": {"type": "string"},
                }
            },
        },
        "x-kubernetes-group-version-kind": [{"group": "", "version": "v1", "kind": "Status"}],
    })
}

fn path_parameter(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "type": "string",
        "description": description,
    })
}

fn query_parameters() -> Vec<Value> {
    vec![
        json!({
            "name": "fieldSelector",
            "in": "query",
            "type": "string",
            "description": "Selects objects by metadata.name or metadata.namespace",
        }),
        json!({
            "name": "format",
            "in": "query",
            "type": "string",
            "enum": ["json", "yaml"],
        }),
    ]
}

fn operation(verb: &str, descriptor: &KindDescriptor, response: &str, body: bool) -> Value {
    let mut parameters = query_parameters();
    if body {
        parameters.push(json!({
            "name": "body",
            "in": "body",
            "required": true,
            "schema": reference(&definition_name(descriptor)),
        }));
    }
    let success = if verb == "create" { "201" } else { "200" };
    let action = if verb == "create" { "post" } else { verb };
    json!({
        "tags": ["opencp"],
        "operationId": format!("{verb}{}", descriptor.kind),
        "consumes": ["application/json", "application/yaml"],
        "produces": ["application/json", "application/yaml"],
        "parameters": parameters,
        "responses": {
            success: {"description": "OK", "schema": reference(response)},
            "401": {"description": "Unauthorized", "schema": reference(STATUS_REF)},
            "404": {"description": "Not Found", "schema": reference(STATUS_REF)},
            "500": {"description": "Internal Server Error", "schema": reference(STATUS_REF)},
        },
        "x-kubernetes-action": action,
    })
}

fn kind_paths(descriptor: &KindDescriptor) -> Vec<(String, Value)> {
    let base = descriptor.base_path();
    let plural = descriptor.plural;
    let item = definition_name(descriptor);
    let list = format!("{item}List");

    let namespace = path_parameter("namespace", "object name and auth scope");
    let name = path_parameter("name", format!("name of the {}", descriptor.kind).as_str());

    if descriptor.group.is_empty() {
        return vec![
            (
                format!("{base}/{plural}"),
                json!({
                    "get": operation("list", descriptor, &list, false),
                    "post": operation("create", descriptor, &item, true),
                }),
            ),
            (
                format!("{base}/{plural}/{{namespace}}"),
                json!({
                    "parameters": [namespace],
                    "get": operation("get", descriptor, &item, false),
                    "delete": operation("delete", descriptor, STATUS_REF, false),
                }),
            ),
        ];
    }

    let mut collection = json!({"get": operation("list", descriptor, &list, false)});
    if !descriptor.namespaced {
        collection["post"] = operation("create", descriptor, &item, true);
    }
    let mut paths = vec![
        (format!("{base}/{plural}"), collection),
        (
            format!("{base}/namespaces/{{namespace}}/{plural}"),
            json!({
                "parameters": [namespace.clone()],
                "get": operation("list", descriptor, &list, false),
                "post": operation("create", descriptor, &item, true),
            }),
        ),
        (
            format!("{base}/namespaces/{{namespace}}/{plural}/{{name}}"),
            json!({
                "parameters": [namespace, name.clone()],
                "get": operation("get", descriptor, &item, false),
                "delete": operation("delete", descriptor, STATUS_REF, false),
            }),
        ),
    ];
    if !descriptor.namespaced {
        paths.push((
            format!("{base}/{plural}/{{name}}"),
            json!({
                "parameters": [name],
                "get": operation("get", descriptor, &item, false),
                "delete": operation("delete", descriptor, STATUS_REF, false),
            }),
        ));
    }
    paths
}
