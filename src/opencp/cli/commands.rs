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

use crate::opencp::config::{Setting, ShimConfig};
use crate::opencp::logger::{self, log_info};
use crate::opencp::observability::tracing;
use crate::opencp::server::{self, openapi::document::registry_document};
use crate::opencp::util::error::{with_context, DynError};

use super::args::{Commands, ServeArgs};

pub async fn run(command: &Commands) -> Result<(), DynError> {
    match command {
        Commands::Serve(args) => {
            let config = resolve_config(args)?;
            logger::set_log_format(config.log.format()?);
            logger::set_min_level(config.log.level()?);
            tracing::init();
            log_info(
                "cli",
                "Starting opencp-shim",
                &[("version", env!("CARGO_PKG_VERSION"))],
            );
            server::serve(config).await
        }
        Commands::Openapi => {
            let json = serde_json::to_string_pretty(&registry_document())
                .map_err(|e| with_context(e, "Failed to serialize OpenAPI document"))?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Loads the configuration file, then lets command-line flags override it.
pub fn resolve_config(args: &ServeArgs) -> Result<ShimConfig, DynError> {
    let path = args.config.clone().unwrap_or_else(Setting::config_path);
    let mut config = ShimConfig::load(&path)?;
    if let Some(listen) = &args.listen {
        config.server.listen = listen.clone();
    }
    if let Some(metrics_listen) = &args.metrics_listen {
        config.server.metrics_listen = metrics_listen.clone();
    }
    if let Some(format) = &args.log_format {
        config.log.format = format.clone();
    }
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn flags_override_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Server:\n  Listen: 127.0.0.1:5000\n").unwrap();
        let args = ServeArgs {
            config: Some(file.path().to_path_buf()),
            listen: Some("127.0.0.1:6000".to_string()),
            ..ServeArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:6000");
    }

    #[test]
    #[serial]
    fn invalid_flag_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let args = ServeArgs {
            config: Some(file.path().to_path_buf()),
            log_format: Some("xml".to_string()),
            ..ServeArgs::default()
        };
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
