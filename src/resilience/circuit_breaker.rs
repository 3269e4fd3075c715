//! Circuit breaker state for the upstream.
//!
//! # States
//! - Healthy: normal operation, requests pass through
//! - Open: upstream unreachable, requests fail fast
//! - Degraded: upstream slow, half of the traffic is admitted
//!
//! # State Transitions
//! ```text
//! any      → Open:     probe fails at the transport level
//! any      → Healthy:  probe answers within LATENCY_THRESHOLD
//! any      → Degraded: probe answers after LATENCY_THRESHOLD
//! Healthy  → Degraded: a proxied request reports latency > LATENCY_THRESHOLD
//! ```
//!
//! # Design Decisions
//! - One breaker for the single upstream, owned by the server and shared by `Arc`
//! - State lives in an atomic so admission never waits on the monitor
//! - Only the health monitor writes the state

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use crate::observability::metrics;

/// Responses slower than this mark the upstream as degraded.
pub const LATENCY_THRESHOLD: Duration = Duration::from_secs(5);

/// How often the health monitor probes the upstream.
pub const MONITOR_CADENCE: Duration = Duration::from_secs(5);

/// Breaker state enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakerState {
    Healthy = 0,
    Open = 1,
    Degraded = 2,
}

impl BreakerState {
    /// Stable lowercase name, used for log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Healthy => "healthy",
            BreakerState::Open => "open",
            BreakerState::Degraded => "degraded",
        }
    }
}

impl From<u8> for BreakerState {
    fn from(val: u8) -> Self {
        match val {
            1 => BreakerState::Open,
            2 => BreakerState::Degraded,
            _ => BreakerState::Healthy,
        }
    }
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide breaker for the upstream.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
}

impl CircuitBreaker {
    /// Create a breaker in the `Healthy` state.
    pub fn new() -> Self {
        metrics::record_breaker_state(BreakerState::Healthy);
        Self {
            state: AtomicU8::new(BreakerState::Healthy as u8),
        }
    }

    /// Current state. Never blocks.
    pub fn state(&self) -> BreakerState {
        BreakerState::from(self.state.load(Ordering::Acquire))
    }

    /// Publish a new state, returning the previous one.
    pub(crate) fn transition_to(&self, next: BreakerState) -> BreakerState {
        let prev = BreakerState::from(self.state.swap(next as u8, Ordering::AcqRel));
        if prev != next {
            log_transition(prev, next);
        }
        prev
    }

    /// Move from `from` to `to` only if the breaker is still in `from`.
    ///
    /// Returns `true` when the transition happened.
    pub(crate) fn transition_if(&self, from: BreakerState, to: BreakerState) -> bool {
        let swapped = self
            .state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if swapped && from != to {
            log_transition(from, to);
        }
        swapped
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

fn log_transition(from: BreakerState, to: BreakerState) {
    match to {
        BreakerState::Healthy => {
            tracing::info!(from = %from, to = %to, "Circuit breaker closed, allowing all traffic")
        }
        BreakerState::Open => {
            tracing::warn!(from = %from, to = %to, "Circuit breaker opened, rejecting all traffic")
        }
        BreakerState::Degraded => {
            tracing::warn!(from = %from, to = %to, "Circuit breaker degraded, limiting traffic")
        }
    }
    metrics::record_breaker_transition(from, to);
}
