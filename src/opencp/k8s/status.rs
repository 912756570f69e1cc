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

//! The `meta.k8s.io/v1` `Status` envelope returned for deletes and for every
//! error path of the resource API.

use serde::{Deserialize, Serialize};

use super::meta::ListMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusReason {
    NotFound,
    BadRequest,
    Unauthorized,
    InternalError,
    ServiceUnavailable,
    NotAcceptable,
    MethodNotAllowed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ListMeta,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<StatusReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
    pub code: u16,
}

const STATUS_SUCCESS: &str = "Success";
const STATUS_FAILURE: &str = "Failure";

impl Status {
    fn envelope(status: &str, code: u16) -> Self {
        Status {
            api_version: "v1".to_string(),
            kind: "Status".to_string(),
            metadata: ListMeta::default(),
            status: status.to_string(),
            message: String::new(),
            reason: None,
            details: None,
            code,
        }
    }

    pub fn failure(code: u16, reason: StatusReason, message: impl Into<String>) -> Self {
        Status {
            message: message.into(),
            reason: Some(reason),
            ..Self::envelope(STATUS_FAILURE, code)
        }
    }

    /// `<plural>.<group> "<name>" not found`, matching the apiserver wording.
    pub fn not_found(plural: &str, group: &str, name: &str) -> Self {
        let qualified = if group.is_empty() {
            plural.to_string()
        } else {
            format!("{plural}.{group}")
        };
        Status {
            details: Some(StatusDetails {
                name: name.to_string(),
                group: group.to_string(),
                kind: plural.to_string(),
                uid: String::new(),
            }),
            ..Self::failure(
                404,
                StatusReason::NotFound,
                format!("{qualified} \"{name}\" not found"),
            )
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::failure(500, StatusReason::InternalError, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::failure(400, StatusReason::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::failure(401, StatusReason::Unauthorized, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::failure(503, StatusReason::ServiceUnavailable, message)
    }

    pub fn not_acceptable(message: impl Into<String>) -> Self {
        Self::failure(406, StatusReason::NotAcceptable, message)
    }

    pub fn method_not_allowed(message: impl Into<String>) -> Self {
        Self::failure(405, StatusReason::MethodNotAllowed, message)
    }

    /// Successful deletion of `name`.
    pub fn deleted(plural: &str, group: &str, name: &str, uid: &str) -> Self {
        Status {
            details: Some(StatusDetails {
                name: name.to_string(),
                group: group.to_string(),
                kind: plural.to_string(),
                uid: uid.to_string(),
            }),
            ..Self::envelope(STATUS_SUCCESS, 200)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}
