//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe the upstream
//! - Publish the resulting breaker state
//! - Between probes, escalate on slow latencies reported by live traffic

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{self, MissedTickBehavior};

use crate::health::passive::LatencySample;
use crate::health::state::{classify_probe, escalate_on_sample};
use crate::observability::metrics;
use crate::resilience::{BreakerState, CircuitBreaker, MONITOR_CADENCE};
use crate::upstream::Upstream;

pub struct HealthMonitor {
    breaker: Arc<CircuitBreaker>,
    upstream: Arc<dyn Upstream>,
    samples: mpsc::Receiver<LatencySample>,
}

impl HealthMonitor {
    pub fn new(
        breaker: Arc<CircuitBreaker>,
        upstream: Arc<dyn Upstream>,
        samples: mpsc::Receiver<LatencySample>,
    ) -> Self {
        Self {
            breaker,
            upstream,
            samples,
        }
    }

    /// Run until shutdown is signalled.
    ///
    /// The first probe fires immediately; later ones every `MONITOR_CADENCE`.
    /// A probe in flight is abandoned on shutdown.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            cadence_secs = MONITOR_CADENCE.as_secs(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(MONITOR_CADENCE);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.probe_once() => {}
                        _ = shutdown.recv() => break,
                    }
                }
                Some(sample) = self.samples.recv() => {
                    self.apply_sample(sample);
                }
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Health monitor received shutdown signal, exiting loop");
    }

    /// Probe the upstream once and publish the implied state.
    pub async fn probe_once(&self) -> BreakerState {
        tracing::debug!("Probing upstream");
        let result = self.upstream.probe().await;
        metrics::record_upstream_call("probe", result.latency, result.error());

        let next = classify_probe(&result);
        match (next, result.error()) {
            (BreakerState::Open, Some(e)) => {
                tracing::warn!(error = %e, "Upstream did not respond, stopping traffic")
            }
            (BreakerState::Degraded, _) => tracing::warn!(
                latency_ms = result.latency.as_millis() as u64,
                "Upstream responded slowly, restricting traffic"
            ),
            _ => tracing::debug!(
                latency_ms = result.latency.as_millis() as u64,
                "Upstream responded in time"
            ),
        }

        self.breaker.transition_to(next);
        next
    }

    fn apply_sample(&self, sample: LatencySample) {
        let current = self.breaker.state();
        if let Some(next) = escalate_on_sample(current, sample.latency()) {
            if self.breaker.transition_if(current, next) {
                tracing::warn!(
                    latency_ms = sample.latency().as_millis() as u64,
                    "Slow proxied request, restricting traffic before next probe"
                );
            }
        }
    }
}
