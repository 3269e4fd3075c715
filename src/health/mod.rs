//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Ticker (every MONITOR_CADENCE)
//!     → Probe the upstream
//!     → state.rs classifies the result
//!     → Publish to the circuit breaker
//!
//! Passive health checks (passive.rs):
//!     Proxied request completes
//!     → Latency sample (best effort, drop when full)
//!     → Monitor escalates Healthy → Degraded on a slow sample
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - The monitor is the only writer of breaker state
//! - One monitor for the single upstream

pub mod active;
pub mod passive;
pub mod state;

pub use active::HealthMonitor;
pub use passive::{latency_channel, LatencyReporter, LatencySample};
