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

use axum::extract::State;
use axum::Json;

use crate::opencp::k8s::discovery::{
    APIGroup, APIGroupList, APIResource, APIResourceList, APIVersions, VersionInfo,
};
use crate::opencp::resources::kinds::NAMESPACE;
use crate::opencp::resources::{opencp_descriptors, OPENCP_GROUP, OPENCP_VERSION};
use crate::opencp::server::AppState;

pub async fn version() -> Json<VersionInfo> {
    Json(VersionInfo::opencp())
}

/// `/api`. The advertised address defaults to the listen address.
pub async fn core_api_versions(State(state): State<AppState>) -> Json<APIVersions> {
    let server = &state.config.server;
    let address = server
        .advertise_address
        .clone()
        .filter(|addr| !addr.is_empty())
        .unwrap_or_else(|| server.listen.clone());
    Json(APIVersions::core(Some(address)))
}

pub async fn core_api_resources() -> Json<APIResourceList> {
    let namespaces = NAMESPACE.api_resource();
    let status = APIResource {
        name: format!("{}/status", NAMESPACE.plural),
        singular_name: String::new(),
        verbs: vec!["get".to_string()],
        short_names: Vec::new(),
        ..namespaces.clone()
    };
    Json(APIResourceList::new("v1", vec![namespaces, status]))
}

pub async fn api_groups() -> Json<APIGroupList> {
    Json(APIGroupList::new(vec![APIGroup::single_version(
        OPENCP_GROUP,
        OPENCP_VERSION,
    )]))
}

pub async fn opencp_api_group() -> Json<APIGroup> {
    Json(APIGroup::standalone(OPENCP_GROUP, OPENCP_VERSION))
}

/// Resources from the `ApiResource` configuration section, or the built-in
/// registry when the section is empty.
pub async fn opencp_api_resources(State(state): State<AppState>) -> Json<APIResourceList> {
    let resources = if state.config.api_resources.is_empty() {
        opencp_descriptors()
            .into_iter()
            .map(|descriptor| descriptor.api_resource())
            .collect()
    } else {
        state
            .config
            .api_resources
            .iter()
            .map(|entry| entry.to_api_resource())
            .collect()
    };
    Json(APIResourceList::new(
        format!("{OPENCP_GROUP}/{OPENCP_VERSION}"),
        resources,
    ))
}
