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

//! Shim configuration: a YAML file plus environment overrides.

use std::env;
use std::error::Error;
use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::opencp::k8s::discovery::APIResource;
use crate::opencp::logger::{LogFormat, LogLevel};

const DEFAULT_LISTEN: &str = "0.0.0.0:4000";
const DEFAULT_METRICS_LISTEN: &str = "0.0.0.0:8081";
const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings that may be overridden from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    ConfigFile,
    BackendHost,
    Listen,
    MetricsListen,
    AuthEnabled,
    LogFormat,
}

impl Setting {
    pub fn env_var(&self) -> &'static str {
        match self {
            Setting::ConfigFile => "OPENCP_CONFIG",
            Setting::BackendHost => "GRPC_SERVER",
            Setting::Listen => "OPENCP_LISTEN",
            Setting::MetricsListen => "OPENCP_METRICS_LISTEN",
            Setting::AuthEnabled => "OPENCP_AUTH_ENABLED",
            Setting::LogFormat => "OPENCP_LOG_FORMAT",
        }
    }

    fn from_env(&self) -> Option<String> {
        env::var(self.env_var()).ok().filter(|value| !value.is_empty())
    }

    /// Config file location from `OPENCP_CONFIG`, defaulting to `config.yaml`.
    pub fn config_path() -> PathBuf {
        Setting::ConfigFile
            .from_env()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.yaml"))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EmptyPath,
    Missing(PathBuf),
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, message: String },
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyPath => write!(f, "config file name is empty"),
            ConfigError::Missing(path) => {
                write!(f, "config file {} does not exist", path.display())
            }
            ConfigError::Read { path, source } => {
                write!(f, "error reading config file {}: {source}", path.display())
            }
            ConfigError::Parse { path, message } => {
                write!(f, "error parsing config file {}: {message}", path.display())
            }
            ConfigError::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Discovery entry advertised under `/apis/opencp.io/v1alpha1`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResourceEntry {
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "SingularName", default)]
    pub singular_name: String,
    #[serde(rename = "Kind", default)]
    pub kind: String,
    #[serde(rename = "Namespaced", default)]
    pub namespaced: bool,
    #[serde(rename = "Verbs", default)]
    pub verbs: Vec<String>,
    #[serde(rename = "ShortNames", default)]
    pub short_names: Vec<String>,
    #[serde(rename = "Version", default)]
    pub version: String,
}

impl ApiResourceEntry {
    pub fn to_api_resource(&self) -> APIResource {
        APIResource {
            name: self.name.clone(),
            singular_name: self.singular_name.clone(),
            namespaced: self.namespaced,
            kind: self.kind.clone(),
            verbs: self.verbs.clone(),
            short_names: self.short_names.clone(),
            categories: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Control-plane address; empty selects the in-memory backend.
    #[serde(rename = "Host", default)]
    pub host: String,
    #[serde(rename = "Timeout", default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

impl BackendConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match self.timeout.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_BACKEND_TIMEOUT),
            Some(text) => humantime::parse_duration(text).map_err(|err| {
                ConfigError::Invalid(format!("GrpcServer.Timeout '{text}': {err}"))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(rename = "Listen", default = "default_listen")]
    pub listen: String,
    /// Empty disables the metrics listener.
    #[serde(rename = "MetricsListen", default = "default_metrics_listen")]
    pub metrics_listen: String,
    #[serde(
        rename = "AdvertiseAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub advertise_address: Option<String>,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_metrics_listen() -> String {
    DEFAULT_METRICS_LISTEN.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: default_listen(),
            metrics_listen: default_metrics_listen(),
            advertise_address: None,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_addr("Server.Listen", &self.listen)
    }

    pub fn metrics_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        if self.metrics_listen.trim().is_empty() {
            return Ok(None);
        }
        parse_addr("Server.MetricsListen", &self.metrics_listen).map(Some)
    }
}

fn parse_addr(field: &str, value: &str) -> Result<SocketAddr, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|err| ConfigError::Invalid(format!("{field} '{value}': {err}")))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(rename = "Enabled", default = "default_true")]
    pub enabled: bool,
    /// Tokens accepted by the in-memory login service.
    #[serde(rename = "Tokens", default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            enabled: true,
            tokens: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "Format", default)]
    pub format: String,
    #[serde(rename = "Level", default)]
    pub level: String,
}

impl LogConfig {
    pub fn format(&self) -> Result<LogFormat, ConfigError> {
        self.format.parse().map_err(ConfigError::Invalid)
    }

    pub fn level(&self) -> Result<LogLevel, ConfigError> {
        self.level.parse().map_err(ConfigError::Invalid)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShimConfig {
    #[serde(rename = "ApiResource", default)]
    pub api_resources: Vec<ApiResourceEntry>,
    #[serde(rename = "GrpcServer", default)]
    pub backend: BackendConfig,
    #[serde(rename = "Server", default)]
    pub server: ServerConfig,
    #[serde(rename = "Auth", default)]
    pub auth: AuthConfig,
    #[serde(rename = "Log", default)]
    pub log: LogConfig,
}

impl ShimConfig {
    /// Reads `path`, applies environment overrides and validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|err| err.to_string())
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = Setting::BackendHost.from_env() {
            self.backend.host = host;
        }
        if let Some(listen) = Setting::Listen.from_env() {
            self.server.listen = listen;
        }
        if let Some(listen) = Setting::MetricsListen.from_env() {
            self.server.metrics_listen = listen;
        }
        if let Some(value) = Setting::AuthEnabled.from_env() {
            self.auth.enabled = parse_bool(&value).ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "{} must be a boolean, got '{value}'",
                    Setting::AuthEnabled.env_var()
                ))
            })?;
        }
        if let Some(format) = Setting::LogFormat.from_env() {
            self.log.format = format;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.listen_addr()?;
        self.server.metrics_addr()?;
        self.backend.timeout()?;
        self.log.format()?;
        self.log.level()?;
        for entry in &self.api_resources {
            if entry.name.is_empty() || entry.kind.is_empty() {
                return Err(ConfigError::Invalid(
                    "ApiResource entries require Name and Kind".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn uses_remote_backend(&self) -> bool {
        !self.backend.host.trim().is_empty()
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "off" => Some(false),
        _ => None,
    }
}
