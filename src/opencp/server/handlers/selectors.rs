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

//! `fieldSelector` parsing for list requests.

use std::fmt;

use super::error::ApiError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorError {
    MissingOperator(String),
    MissingKey(String),
    UnsupportedKey(String),
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::MissingOperator(term) => write!(
                f,
                "Unsupported fieldSelector expression '{term}'; expected key=value"
            ),
            SelectorError::MissingKey(term) => {
                write!(f, "Unsupported fieldSelector expression '{term}'; missing key")
            }
            SelectorError::UnsupportedKey(key) => {
                write!(f, "Unsupported fieldSelector key '{key}'")
            }
        }
    }
}

impl std::error::Error for SelectorError {}

impl From<SelectorError> for ApiError {
    fn from(err: SelectorError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldSelector {
    pub metadata_name: Option<String>,
    pub metadata_namespace: Option<String>,
}

impl FieldSelector {
    pub fn is_empty(&self) -> bool {
        self.metadata_name.is_none() && self.metadata_namespace.is_none()
    }
}

/// Parses `key1=val1,key2=val2`. `==` is accepted as a synonym for `=`.
pub fn parse_field_selector(raw: Option<&str>) -> Result<FieldSelector, SelectorError> {
    let mut selector = FieldSelector::default();
    let Some(raw) = raw else {
        return Ok(selector);
    };

    for term in raw.split(',').map(str::trim).filter(|term| !term.is_empty()) {
        let (key, value) = term
            .split_once("==")
            .or_else(|| term.split_once('='))
            .ok_or_else(|| SelectorError::MissingOperator(term.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SelectorError::MissingKey(term.to_string()));
        }
        let value = value.trim().to_string();
        match key {
            "metadata.name" => selector.metadata_name = Some(value),
            "metadata.namespace" => selector.metadata_namespace = Some(value),
            other => return Err(SelectorError::UnsupportedKey(other.to_string())),
        }
    }

    Ok(selector)
}
