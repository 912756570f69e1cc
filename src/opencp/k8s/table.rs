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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::meta::ListMeta;

/// Media type requested by `kubectl get` when it wants server-side printing.
pub const TABLE_CONTENT_TYPE: &str = "application/json;as=Table;g=meta.k8s.io;v=v1";

/// Kubernetes `Table` representation from `meta.k8s.io/v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ListMeta,
    #[serde(rename = "columnDefinitions")]
    pub column_definitions: Vec<TableColumnDefinition>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn new(column_definitions: Vec<TableColumnDefinition>, rows: Vec<TableRow>) -> Self {
        Table {
            api_version: "meta.k8s.io/v1".to_string(),
            kind: "Table".to_string(),
            metadata: ListMeta::default(),
            column_definitions,
            rows,
        }
    }
}

/// Column schema describing how clients should display table cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl TableColumnDefinition {
    /// The leading column, rendered by kubectl as the object name.
    pub fn name(title: &str, description: &str) -> Self {
        Self::typed(title, "string", Some("name"), description)
    }

    pub fn string(title: &str, description: &str) -> Self {
        Self::typed(title, "string", None, description)
    }

    pub fn integer(title: &str, description: &str) -> Self {
        Self::typed(title, "integer", None, description)
    }

    pub fn date_time(title: &str, description: &str) -> Self {
        Self::typed(title, "string", Some("date-time"), description)
    }

    fn typed(title: &str, type_name: &str, format: Option<&str>, description: &str) -> Self {
        TableColumnDefinition {
            name: title.to_string(),
            type_name: type_name.to_string(),
            format: format.map(str::to_string),
            description: Some(description.to_string()),
            priority: None,
        }
    }
}

/// Individual table row with serialized cell values and optional raw object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
}

/// Renders the age of `since` relative to `now` using only the largest unit.
pub fn format_age(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(since);
    let days = elapsed.num_days();
    if days > 0 {
        return format!("{days}d");
    }
    let hours = elapsed.num_hours();
    if hours > 0 {
        return format!("{hours}h");
    }
    let minutes = elapsed.num_minutes();
    if minutes > 0 {
        return format!("{minutes}m");
    }
    let millis = elapsed.num_milliseconds();
    if millis > 0 {
        return format!("{:.1}s", millis as f64 / 1000.0);
    }
    "0s".to_string()
}
