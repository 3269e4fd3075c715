//! Admission gate consulted before every upstream call.

use std::sync::Arc;

use crate::observability::metrics;
use crate::resilience::circuit_breaker::{BreakerState, CircuitBreaker};
use crate::resilience::sampler::TrafficSampler;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// Forward the request to the upstream.
    Allow,
    /// Breaker is open; fail without calling the upstream.
    RejectFailure,
    /// Breaker is degraded and this request drew the block token.
    RejectThrottled,
}

impl AdmissionDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdmissionDecision::Allow => "allow",
            AdmissionDecision::RejectFailure => "reject_failure",
            AdmissionDecision::RejectThrottled => "reject_throttled",
        }
    }
}

/// Reads breaker state and decides whether a request may proceed.
#[derive(Debug)]
pub struct AdmissionGate {
    breaker: Arc<CircuitBreaker>,
    sampler: TrafficSampler,
}

impl AdmissionGate {
    pub fn new(breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            breaker,
            sampler: TrafficSampler::new(),
        }
    }

    /// The breaker this gate reads from.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Decide on a single inbound request. Never blocks.
    pub fn admit(&self) -> AdmissionDecision {
        let decision = match self.breaker.state() {
            BreakerState::Healthy => AdmissionDecision::Allow,
            BreakerState::Open => AdmissionDecision::RejectFailure,
            BreakerState::Degraded => {
                if self.sampler.next_token() {
                    AdmissionDecision::RejectThrottled
                } else {
                    AdmissionDecision::Allow
                }
            }
        };
        metrics::record_admission(decision);
        decision
    }
}
