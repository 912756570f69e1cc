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

//! Conversion between backend wire objects and client-facing resources.
//!
//! Spec and status payloads cross the boundary through [`bridge`]: the source
//! is serialised and read back as the target type, so fields are matched by
//! their JSON names. Fields unknown to the target are dropped and fields the
//! source lacks come out zero-valued.

use std::error::Error;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{ResourceKind, ResourceOf, WireObject};
use crate::opencp::api::{Resource, ResourceList};
use crate::opencp::k8s::meta::{ListMeta, PartialObjectMetadata};
use crate::opencp::k8s::table::{Table, TableRow};
use crate::opencp::logger::log_warn;

const COMPONENT: &str = "mapper";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The backend object lacks metadata, spec or status.
    Incomplete(&'static str),
    Encode(String),
    Decode(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Incomplete(part) => write!(f, "backend object has no {part}"),
            MapError::Encode(msg) => write!(f, "failed to encode source payload: {msg}"),
            MapError::Decode(msg) => write!(f, "failed to decode target payload: {msg}"),
        }
    }
}

impl Error for MapError {}

/// Schema bridge between two field-name-compatible types.
pub fn bridge<Src, Dst>(source: &Src) -> Result<Dst, MapError>
where
    Src: Serialize,
    Dst: DeserializeOwned,
{
    let intermediate =
        serde_json::to_value(source).map_err(|err| MapError::Encode(err.to_string()))?;
    serde_json::from_value(intermediate).map_err(|err| MapError::Decode(err.to_string()))
}

/// Converts one backend object into a stamped resource.
pub fn to_resource<K: ResourceKind>(object: &WireObject<K>) -> Result<ResourceOf<K>, MapError> {
    let metadata = object
        .metadata
        .as_ref()
        .ok_or(MapError::Incomplete("metadata"))?;
    let spec = object.spec.as_ref().ok_or(MapError::Incomplete("spec"))?;
    let status = object
        .status
        .as_ref()
        .ok_or(MapError::Incomplete("status"))?;

    let descriptor = K::descriptor();
    Ok(Resource {
        api_version: descriptor.api_version(),
        kind: descriptor.kind.to_string(),
        metadata: metadata.clone(),
        spec: K::bridge_spec(spec)?,
        status: K::bridge_status(status)?,
    })
}

/// Converts a client-facing resource back into the backend schema.
pub fn to_backend<K: ResourceKind>(resource: &ResourceOf<K>) -> Result<WireObject<K>, MapError> {
    Ok(WireObject::<K>::new(
        resource.metadata.clone(),
        K::unbridge_spec(&resource.spec)?,
        K::unbridge_status(&resource.status)?,
    ))
}

/// Placeholder emitted for a list item that could not be converted: stamped
/// type information, the item's metadata when present, zero-valued payloads.
pub fn empty_entry<K: ResourceKind>(object: &WireObject<K>) -> ResourceOf<K> {
    let descriptor = K::descriptor();
    Resource {
        api_version: descriptor.api_version(),
        kind: descriptor.kind.to_string(),
        metadata: object.metadata.clone().unwrap_or_default(),
        spec: K::Spec::default(),
        status: K::Status::default(),
    }
}

/// Typed list. Every backend item yields exactly one entry; items that fail
/// conversion are kept as [`empty_entry`] values.
pub fn to_list<K: ResourceKind>(objects: &[WireObject<K>]) -> ResourceList<ResourceOf<K>> {
    let items = objects
        .iter()
        .map(|object| match to_resource::<K>(object) {
            Ok(resource) => resource,
            Err(err) => {
                report_failure::<K>(object, &err, "Emitting empty list entry");
                empty_entry::<K>(object)
            }
        })
        .collect();
    wrap_list::<K>(items)
}

pub fn wrap_list<K: ResourceKind>(items: Vec<ResourceOf<K>>) -> ResourceList<ResourceOf<K>> {
    let descriptor = K::descriptor();
    ResourceList {
        api_version: descriptor.api_version(),
        kind: descriptor.list_kind.to_string(),
        metadata: ListMeta::default(),
        items,
    }
}

/// Table projection of a list. Items that fail conversion produce no row.
pub fn to_table<K: ResourceKind>(objects: &[WireObject<K>], now: DateTime<Utc>) -> Table {
    let rows = objects
        .iter()
        .filter_map(|object| match to_resource::<K>(object) {
            Ok(resource) => Some(table_row::<K>(&resource, now)),
            Err(err) => {
                report_failure::<K>(object, &err, "Skipping table row");
                None
            }
        })
        .collect();
    Table::new(K::columns(), rows)
}

/// Table projection of a single resource.
pub fn single_row_table<K: ResourceKind>(resource: &ResourceOf<K>, now: DateTime<Utc>) -> Table {
    Table::new(K::columns(), vec![table_row::<K>(resource, now)])
}

fn table_row<K: ResourceKind>(resource: &ResourceOf<K>, now: DateTime<Utc>) -> TableRow {
    let object = serde_json::to_value(PartialObjectMetadata::from_meta(&resource.metadata)).ok();
    TableRow {
        cells: K::cells(resource, now),
        object,
    }
}

fn report_failure<K: ResourceKind>(object: &WireObject<K>, err: &MapError, action: &str) {
    let error_text = err.to_string();
    log_warn(
        COMPONENT,
        action,
        &[
            ("kind", K::descriptor().kind),
            ("name", object.name().unwrap_or("<unknown>")),
            ("error", error_text.as_str()),
        ],
    );
}
