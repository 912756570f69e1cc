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

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Kubernetes-compatible REST front end for the OpenCP control plane.
#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
pub struct OpenCpShim {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the Kubernetes-compatible API
    Serve(ServeArgs),

    /// Print the OpenAPI document as JSON
    Openapi,
}

#[derive(Args, Default)]
pub struct ServeArgs {
    /// Configuration file (defaults to $OPENCP_CONFIG, then config.yaml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to bind the API server (e.g. 0.0.0.0:4000)
    #[arg(long)]
    pub listen: Option<String>,

    /// Address to bind the metrics and health listener; empty disables it
    #[arg(long)]
    pub metrics_listen: Option<String>,

    /// Log output format: text or json
    #[arg(long)]
    pub log_format: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_are_optional() {
        let cli = OpenCpShim::try_parse_from(["opencp-shim", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert!(args.config.is_none());
                assert!(args.listen.is_none());
            }
            Commands::Openapi => panic!("expected serve"),
        }
    }

    #[test]
    fn serve_flags_parse() {
        let cli = OpenCpShim::try_parse_from([
            "opencp-shim",
            "serve",
            "--config",
            "/etc/opencp/config.yaml",
            "--listen",
            "127.0.0.1:4443",
            "--log-format",
            "json",
        ])
        .unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.config, Some(PathBuf::from("/etc/opencp/config.yaml")));
        assert_eq!(args.listen.as_deref(), Some("127.0.0.1:4443"));
        assert_eq!(args.log_format.as_deref(), Some("json"));
    }
}
