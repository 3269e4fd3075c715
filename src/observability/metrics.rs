//! Metrics collection and exposition.
//!
//! # Metrics
//! - `breaker_state` (gauge): 0=healthy, 1=open, 2=degraded
//! - `breaker_transitions_total` (counter): by from, to
//! - `breaker_admissions_total` (counter): by decision
//! - `breaker_latency_samples_dropped_total` (counter)
//! - `upstream_requests_total` (counter): by kind (probe/proxy), outcome
//! - `upstream_latency_seconds` (histogram): by kind
//! - `proxy_requests_total` (counter): by status
//! - `proxy_request_duration_seconds` (histogram)
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! metrics-disabled runs pay nothing beyond the macro call.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::{AdmissionDecision, BreakerState, LATENCY_THRESHOLD};
use crate::upstream::UpstreamError;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_breaker_state(state: BreakerState) {
    gauge!("breaker_state").set(state as u8 as f64);
}

pub fn record_breaker_transition(from: BreakerState, to: BreakerState) {
    counter!("breaker_transitions_total", "from" => from.as_str(), "to" => to.as_str()).increment(1);
    record_breaker_state(to);
}

pub fn record_admission(decision: AdmissionDecision) {
    counter!("breaker_admissions_total", "decision" => decision.as_str()).increment(1);
}

pub fn record_sample_dropped() {
    counter!("breaker_latency_samples_dropped_total").increment(1);
}

/// Record one upstream call. `kind` is `probe` or `proxy`.
pub fn record_upstream_call(kind: &'static str, latency: Duration, error: Option<&UpstreamError>) {
    let outcome = match error {
        Some(_) => "error",
        None if latency > LATENCY_THRESHOLD => "slow",
        None => "ok",
    };
    counter!("upstream_requests_total", "kind" => kind, "outcome" => outcome).increment(1);
    histogram!("upstream_latency_seconds", "kind" => kind).record(latency.as_secs_f64());
}

/// Record a response sent to a caller.
pub fn record_request(status: u16, start: Instant) {
    counter!("proxy_requests_total", "status" => status.to_string()).increment(1);
    histogram!("proxy_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
