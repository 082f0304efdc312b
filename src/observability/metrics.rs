//! Metrics collection and exposition.
//!
//! # Metrics
//! - `user_service_requests_total` (counter): requests by method, status
//! - `user_service_requests_success_total` / `_failure_total` (counters)
//! - `user_service_request_latency_ms` (histogram)
//! - `user_service_circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `user_service_circuit_breaker_transitions_total` (counter): by from, to
//! - `user_service_store_writes_total` (counter): by outcome
//! - `user_service_write_retries_total` (counter)
//! - `user_service_write_retries_exhausted_total` (counter)

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use thiserror::Error;

use crate::resilience::CircuitState;

pub const REQUESTS_TOTAL: &str = "user_service_requests_total";
pub const REQUESTS_SUCCESS: &str = "user_service_requests_success_total";
pub const REQUESTS_FAILURE: &str = "user_service_requests_failure_total";
pub const REQUEST_LATENCY_MS: &str = "user_service_request_latency_ms";
pub const BREAKER_STATE: &str = "user_service_circuit_breaker_state";
pub const BREAKER_TRANSITIONS: &str = "user_service_circuit_breaker_transitions_total";
pub const STORE_WRITES: &str = "user_service_store_writes_total";
pub const WRITE_RETRIES: &str = "user_service_write_retries_total";
pub const WRITE_RETRIES_EXHAUSTED: &str = "user_service_write_retries_exhausted_total";

/// Latency buckets in milliseconds. Retried writes land in the upper range.
const LATENCY_BUCKETS_MS: &[f64] = &[
    1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0,
];

/// Error type for metrics setup.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metrics exporter error: {0}")]
    Exporter(#[from] metrics_exporter_prometheus::BuildError),
}

/// Install the Prometheus recorder as the global metrics recorder.
///
/// The returned handle renders the exposition text; the caller serves it.
pub fn install_recorder() -> Result<PrometheusHandle, MetricsError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_LATENCY_MS.to_string()), LATENCY_BUCKETS_MS)?
        .install_recorder()?;

    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, status: u16, latency: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if (200..400).contains(&status) {
        counter!(REQUESTS_SUCCESS).increment(1);
    } else {
        counter!(REQUESTS_FAILURE).increment(1);
    }

    histogram!(REQUEST_LATENCY_MS).record(latency.as_secs_f64() * 1000.0);
}

/// Gauge encoding of a breaker state.
pub fn breaker_state_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    }
}

pub fn record_breaker_state(state: CircuitState) {
    gauge!(BREAKER_STATE).set(breaker_state_value(state));
}

pub fn record_breaker_transition(from: CircuitState, to: CircuitState) {
    counter!(
        BREAKER_TRANSITIONS,
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Record a store write by outcome (persisted, replayed, injected_failure, rejected).
pub fn record_store_write(outcome: &'static str) {
    counter!(STORE_WRITES, "outcome" => outcome).increment(1);
}

pub fn record_retry() {
    counter!(WRITE_RETRIES).increment(1);
}

pub fn record_retries_exhausted() {
    counter!(WRITE_RETRIES_EXHAUSTED).increment(1);
}
