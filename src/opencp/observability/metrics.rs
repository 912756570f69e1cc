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

use std::error::Error;
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use prometheus::core::Collector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

static REGISTRY: OnceLock<Registry> = OnceLock::new();
static HTTP_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static HTTP_REQUEST_DURATION: OnceLock<HistogramVec> = OnceLock::new();
static BACKEND_CALLS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
static BACKEND_CALL_DURATION: OnceLock<HistogramVec> = OnceLock::new();
static OPENAPI_GENERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        Registry::new_custom(Some("opencp".to_string()), None)
            .expect("failed to initialise opencp metrics registry")
    })
}

fn register_collector<C>(collector: C) -> C
where
    C: Clone + Collector + Send + Sync + 'static,
{
    registry()
        .register(Box::new(collector.clone()))
        .expect("failed to register opencp metric collector");
    collector
}

fn http_requests_total() -> &'static IntCounterVec {
    HTTP_REQUESTS_TOTAL.get_or_init(|| {
        let opts = Opts::new(
            "requests_total",
            "HTTP requests grouped by method, matched route and status code",
        )
        .subsystem("http");
        let counter = IntCounterVec::new(opts, &["method", "route", "code"])
            .expect("failed to build http requests counter");
        register_collector(counter)
    })
}

fn http_request_duration() -> &'static HistogramVec {
    HTTP_REQUEST_DURATION.get_or_init(|| {
        let opts = HistogramOpts::new(
            "request_duration_seconds",
            "Latency distribution of HTTP requests",
        )
        .subsystem("http")
        .buckets(LATENCY_BUCKETS.to_vec());
        let histogram = HistogramVec::new(opts, &["method", "route"])
            .expect("failed to build http request histogram");
        register_collector(histogram)
    })
}

fn backend_calls_total() -> &'static IntCounterVec {
    BACKEND_CALLS_TOTAL.get_or_init(|| {
        let opts = Opts::new(
            "calls_total",
            "Control-plane calls grouped by kind, operation and result",
        )
        .subsystem("backend");
        let counter = IntCounterVec::new(opts, &["kind", "operation", "result"])
            .expect("failed to build backend calls counter");
        register_collector(counter)
    })
}

fn backend_call_duration() -> &'static HistogramVec {
    BACKEND_CALL_DURATION.get_or_init(|| {
        let opts = HistogramOpts::new(
            "call_duration_seconds",
            "Latency distribution of control-plane calls",
        )
        .subsystem("backend")
        .buckets(LATENCY_BUCKETS.to_vec());
        let histogram = HistogramVec::new(opts, &["kind", "operation"])
            .expect("failed to build backend call histogram");
        register_collector(histogram)
    })
}

fn openapi_generations_total() -> &'static IntCounterVec {
    OPENAPI_GENERATIONS_TOTAL.get_or_init(|| {
        let opts = Opts::new(
            "generations_total",
            "OpenAPI document encodings computed, grouped by encoding and result",
        )
        .subsystem("openapi");
        let counter = IntCounterVec::new(opts, &["encoding", "result"])
            .expect("failed to build openapi generation counter");
        register_collector(counter)
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendOperation {
    List,
    Get,
    Create,
    Delete,
    Login,
}

impl BackendOperation {
    fn as_label(self) -> &'static str {
        match self {
            BackendOperation::List => "list",
            BackendOperation::Get => "get",
            BackendOperation::Create => "create",
            BackendOperation::Delete => "delete",
            BackendOperation::Login => "login",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum OperationOutcome {
    Success,
    Error,
}

impl OperationOutcome {
    fn as_label(self) -> &'static str {
        match self {
            OperationOutcome::Success => "success",
            OperationOutcome::Error => "error",
        }
    }
}

pub fn record_http_request(method: &str, route: &str, code: u16, duration: Duration) {
    let code_text = code.to_string();
    http_requests_total()
        .with_label_values(&[method, route, code_text.as_str()])
        .inc();
    http_request_duration()
        .with_label_values(&[method, route])
        .observe(duration.as_secs_f64());
}

fn record_backend_call(
    kind: &str,
    operation: BackendOperation,
    outcome: OperationOutcome,
    duration: Duration,
) {
    backend_calls_total()
        .with_label_values(&[kind, operation.as_label(), outcome.as_label()])
        .inc();
    backend_call_duration()
        .with_label_values(&[kind, operation.as_label()])
        .observe(duration.as_secs_f64());
}

/// Wraps a control-plane call and records its outcome and latency.
pub async fn observe_backend_call<F, T, E>(
    kind: &str,
    operation: BackendOperation,
    future: F,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    let result = future.await;
    let outcome = if result.is_ok() {
        OperationOutcome::Success
    } else {
        OperationOutcome::Error
    };
    record_backend_call(kind, operation, outcome, start.elapsed());
    result
}

pub fn record_openapi_generation(encoding: &str, success: bool) {
    let outcome = if success {
        OperationOutcome::Success
    } else {
        OperationOutcome::Error
    };
    openapi_generations_total()
        .with_label_values(&[encoding, outcome.as_label()])
        .inc();
}

pub fn gather() -> Result<Vec<u8>, Box<dyn Error + Send + Sync>> {
    let metric_families = registry().gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|err| Box::new(err) as Box<dyn Error + Send + Sync>)?;
    Ok(buffer)
}
