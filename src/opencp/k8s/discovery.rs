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

/// Kubernetes minor release whose discovery surface kubectl is served.
const KUBERNETES_MAJOR: &str = "1";
const KUBERNETES_MINOR: &str = "24";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VersionInfo {
    pub major: String,
    pub minor: String,
    #[serde(rename = "gitVersion")]
    pub git_version: String,
    #[serde(rename = "gitCommit")]
    pub git_commit: String,
    #[serde(rename = "gitTreeState")]
    pub git_tree_state: String,
    #[serde(rename = "buildDate")]
    pub build_date: String,
    pub compiler: String,
    pub platform: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct APIVersions {
    pub kind: String,
    pub versions: Vec<String>,
    #[serde(
        rename = "serverAddressByClientCIDRs",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub server_address_by_client_cidrs: Vec<ServerAddressByClientCIDR>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerAddressByClientCIDR {
    #[serde(rename = "clientCIDR")]
    pub client_cidr: String,
    #[serde(rename = "serverAddress")]
    pub server_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct APIGroupList {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub groups: Vec<APIGroup>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct APIGroup {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub name: String,
    pub versions: Vec<GroupVersion>,
    #[serde(rename = "preferredVersion")]
    pub preferred_version: GroupVersion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersion {
    #[serde(rename = "groupVersion")]
    pub group_version: String,
    pub version: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct APIResourceList {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(rename = "groupVersion")]
    pub group_version: String,
    pub resources: Vec<APIResource>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct APIResource {
    pub name: String,
    #[serde(rename = "singularName")]
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    pub verbs: Vec<String>,
    #[serde(rename = "shortNames", default, skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl VersionInfo {
    pub fn opencp() -> Self {
        VersionInfo {
            major: KUBERNETES_MAJOR.to_string(),
            minor: KUBERNETES_MINOR.to_string(),
            git_version: format!("v{KUBERNETES_MAJOR}.{KUBERNETES_MINOR}.0"),
            git_commit: option_env!("OPENCP_GIT_COMMIT")
                .unwrap_or("unknown")
                .to_string(),
            git_tree_state: option_env!("OPENCP_GIT_TREE_STATE")
                .unwrap_or("clean")
                .to_string(),
            build_date: option_env!("OPENCP_BUILD_DATE")
                .unwrap_or("1970-01-01T00:00:00Z")
                .to_string(),
            compiler: option_env!("RUSTC_VERSION")
                .unwrap_or("rustc unknown")
                .to_string(),
            platform: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }
}

impl APIVersions {
    pub fn core(server_address: Option<String>) -> Self {
        APIVersions {
            kind: "APIVersions".to_string(),
            versions: vec!["v1".to_string()],
            server_address_by_client_cidrs: server_address
                .map(|addr| {
                    vec![ServerAddressByClientCIDR {
                        client_cidr: "0.0.0.0/0".to_string(),
                        server_address: addr,
                    }]
                })
                .unwrap_or_default(),
        }
    }
}

impl APIGroup {
    /// Single-version group as listed inside an `APIGroupList`.
    pub fn single_version(group: &str, version: &str) -> Self {
        let group_version = GroupVersion {
            group_version: format!("{group}/{version}"),
            version: version.to_string(),
        };
        APIGroup {
            api_version: String::new(),
            kind: String::new(),
            name: group.to_string(),
            versions: vec![group_version.clone()],
            preferred_version: group_version,
        }
    }

    /// Same group served standalone from `/apis/<group>`.
    pub fn standalone(group: &str, version: &str) -> Self {
        APIGroup {
            api_version: "v1".to_string(),
            kind: "APIGroup".to_string(),
            ..Self::single_version(group, version)
        }
    }
}

impl APIGroupList {
    pub fn new(groups: Vec<APIGroup>) -> Self {
        APIGroupList {
            api_version: "v1".to_string(),
            kind: "APIGroupList".to_string(),
            groups,
        }
    }
}

impl APIResourceList {
    pub fn new(group_version: impl Into<String>, resources: Vec<APIResource>) -> Self {
        APIResourceList {
            api_version: "v1".to_string(),
            kind: "APIResourceList".to_string(),
            group_version: group_version.into(),
            resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_reports_kubernetes_minor() {
        let info = VersionInfo::opencp();
        assert_eq!(info.major, "1");
        assert_eq!(info.minor, "24");
        assert_eq!(info.git_version, "v1.24.0");
    }

    #[test]
    fn group_list_entries_omit_type_meta() {
        let value = serde_json::to_value(APIGroup::single_version("opencp.io", "v1alpha1")).unwrap();
        assert!(value.get("kind").is_none());
        assert_eq!(value["preferredVersion"]["groupVersion"], "opencp.io/v1alpha1");

        let standalone = serde_json::to_value(APIGroup::standalone("opencp.io", "v1alpha1")).unwrap();
        assert_eq!(standalone["kind"], "APIGroup");
    }
}
