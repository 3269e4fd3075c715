//! Passive health signals from live traffic.
//!
//! # Responsibilities
//! - Carry latencies of proxied requests to the health monitor
//! - Never stall the request task that reports them
//!
//! # Design Decisions
//! - Bounded channel, `try_send`; a full channel drops the sample
//! - Failed requests report their latency too

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::observability::metrics;

/// Samples buffered between monitor drains.
pub const SAMPLE_CAPACITY: usize = 3;

/// Latency of one completed proxied request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySample(pub Duration);

impl LatencySample {
    pub fn latency(&self) -> Duration {
        self.0
    }
}

/// Sending half handed to request handlers.
#[derive(Debug, Clone)]
pub struct LatencyReporter {
    tx: mpsc::Sender<LatencySample>,
}

/// Create a reporter and the receiver the monitor drains.
pub fn latency_channel() -> (LatencyReporter, mpsc::Receiver<LatencySample>) {
    let (tx, rx) = mpsc::channel(SAMPLE_CAPACITY);
    (LatencyReporter { tx }, rx)
}

impl LatencyReporter {
    /// Hand a sample to the monitor without waiting.
    ///
    /// Returns `false` if the sample was dropped.
    pub fn report(&self, latency: Duration) -> bool {
        match self.tx.try_send(LatencySample(latency)) {
            Ok(()) => true,
            Err(TrySendError::Full(sample)) => {
                tracing::debug!(latency_ms = sample.0.as_millis() as u64, "Monitor busy, dropping latency sample");
                metrics::record_sample_dropped();
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!("Health monitor stopped, discarding latency sample");
                false
            }
        }
    }
}
