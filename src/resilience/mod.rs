//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request:
//!     → admission.rs (read breaker state, decide)
//!         Open     → reject (no upstream call)
//!         Degraded → sampler.rs (alternating token) → reject or allow
//!         Healthy  → allow
//!     → proxy path
//!
//! Health monitor:
//!     → circuit_breaker.rs (publish new state)
//! ```
//!
//! # Design Decisions
//! - A single breaker guards the single upstream
//! - Thresholds are constants, not configuration
//! - Admission is lock-free; breaker and sampler are plain atomics

pub mod admission;
pub mod circuit_breaker;
pub mod sampler;

pub use admission::{AdmissionDecision, AdmissionGate};
pub use circuit_breaker::{BreakerState, CircuitBreaker, LATENCY_THRESHOLD, MONITOR_CADENCE};
pub use sampler::TrafficSampler;
