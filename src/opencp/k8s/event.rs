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
use serde_json::Value;

use super::meta::ListMeta;

/// Events are not recorded by the shim; `kubectl describe` still expects the
/// list endpoint to answer, so it is served empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventList {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: ListMeta,
    pub items: Vec<Value>,
}

impl EventList {
    pub fn empty() -> Self {
        EventList {
            api_version: "v1".to_string(),
            kind: "EventList".to_string(),
            metadata: ListMeta::default(),
            items: Vec::new(),
        }
    }
}
