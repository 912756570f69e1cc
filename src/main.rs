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

use clap::Parser;

use opencp::opencp::cli::{self, OpenCpShim};
use opencp::opencp::logger::log_error;
use opencp::opencp::util::error::root_cause;

#[tokio::main]
async fn main() {
    let shim = OpenCpShim::parse();
    if let Err(err) = cli::run(&shim.command).await {
        let error_text = err.to_string();
        let cause = root_cause(err.as_ref());
        log_error(
            "cli",
            "opencp-shim exited with an error",
            &[("error", error_text.as_str()), ("cause", cause.as_str())],
        );
        std::process::exit(1);
    }
}
