//! Breaker state classification.
//!
//! # Rules
//! ```text
//! probe failed                    → Open
//! probe latency <= threshold      → Healthy
//! probe latency >  threshold      → Degraded
//! sample > threshold while Healthy → Degraded (no other state escalates)
//! ```
//!
//! # Design Decisions
//! - Pure functions: the monitor owns timing, these own the decision
//! - The latest probe fully determines the state; nothing carries over

use std::time::Duration;

use crate::resilience::{BreakerState, LATENCY_THRESHOLD};
use crate::upstream::ProbeResult;

/// State implied by a single probe.
pub fn classify_probe(result: &ProbeResult) -> BreakerState {
    if result.error().is_some() {
        BreakerState::Open
    } else if result.is_slow() {
        BreakerState::Degraded
    } else {
        BreakerState::Healthy
    }
}

/// State to escalate to after a live latency sample, if any.
pub fn escalate_on_sample(current: BreakerState, latency: Duration) -> Option<BreakerState> {
    if current == BreakerState::Healthy && latency > LATENCY_THRESHOLD {
        Some(BreakerState::Degraded)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamError;
    use axum::http::StatusCode;

    fn answered(secs: f64) -> ProbeResult {
        ProbeResult {
            latency: Duration::from_secs_f64(secs),
            outcome: Ok(StatusCode::OK),
        }
    }

    fn failed(secs: f64) -> ProbeResult {
        let latency = Duration::from_secs_f64(secs);
        ProbeResult {
            latency,
            outcome: Err(UpstreamError::Timeout(latency)),
        }
    }

    #[test]
    fn probe_classification() {
        assert_eq!(classify_probe(&answered(0.05)), BreakerState::Healthy);
        assert_eq!(classify_probe(&answered(5.0)), BreakerState::Healthy);
        assert_eq!(classify_probe(&answered(6.0)), BreakerState::Degraded);
        assert_eq!(classify_probe(&failed(0.001)), BreakerState::Open);
        assert_eq!(classify_probe(&failed(10.0)), BreakerState::Open);
    }

    #[test]
    fn only_healthy_escalates_on_slow_sample() {
        let slow = Duration::from_secs(6);
        let fast = Duration::from_millis(200);

        assert_eq!(
            escalate_on_sample(BreakerState::Healthy, slow),
            Some(BreakerState::Degraded)
        );
        assert_eq!(escalate_on_sample(BreakerState::Healthy, fast), None);
        assert_eq!(escalate_on_sample(BreakerState::Healthy, LATENCY_THRESHOLD), None);
        assert_eq!(escalate_on_sample(BreakerState::Open, slow), None);
        assert_eq!(escalate_on_sample(BreakerState::Degraded, slow), None);
    }

    #[test]
    fn latest_probe_wins_over_history() {
        let sequence = [failed(0.1), answered(6.0), answered(0.1), failed(0.1), answered(0.1)];
        let expected = [
            BreakerState::Open,
            BreakerState::Degraded,
            BreakerState::Healthy,
            BreakerState::Open,
            BreakerState::Healthy,
        ];
        for (result, want) in sequence.iter().zip(expected) {
            assert_eq!(classify_probe(result), want);
        }
    }
}
