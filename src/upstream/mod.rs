//! Upstream access subsystem.
//!
//! # Data Flow
//! ```text
//! Health monitor tick → Upstream::probe() → GET <upstream url>
//!                          → ProbeResult { latency, outcome: status }
//!
//! Admitted request    → Upstream::fetch() → GET <upstream url>
//!                          → Fetched { latency, outcome: status + body }
//! ```
//!
//! # Design Decisions
//! - Both calls time the same GET, so latency means the same thing on both paths
//! - Latency is measured up to the response head
//! - A probe never reads the body; only a missing response head is an error
//! - Only the proxy path collects the body, and a body failure affects that
//!   caller alone
//! - No retries here; the monitor's next tick is the retry

pub mod client;

use std::time::Duration;

use axum::body::Bytes;
use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::resilience::LATENCY_THRESHOLD;

pub use client::HyperUpstream;

/// Something that can be asked for the upstream's response.
pub trait Upstream: Send + Sync {
    /// Issue one timed GET and stop at the response head.
    fn probe(&self) -> BoxFuture<'_, ProbeResult>;

    /// Issue one timed GET and collect the body for relaying.
    fn fetch(&self) -> BoxFuture<'_, Fetched>;
}

/// A response received from the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Outcome of a single health probe.
#[derive(Debug)]
pub struct ProbeResult {
    /// Time from issuing the call to receiving the response head, or to failure.
    pub latency: Duration,
    pub outcome: Result<StatusCode, UpstreamError>,
}

impl ProbeResult {
    /// The transport error, if no response head arrived.
    pub fn error(&self) -> Option<&UpstreamError> {
        self.outcome.as_ref().err()
    }

    /// Whether the upstream answered but took longer than the threshold.
    pub fn is_slow(&self) -> bool {
        self.outcome.is_ok() && self.latency > LATENCY_THRESHOLD
    }
}

/// Outcome of a proxied upstream call.
#[derive(Debug)]
pub struct Fetched {
    /// Time to the response head, or to failure. Body collection is excluded.
    pub latency: Duration,
    pub outcome: Result<UpstreamResponse, UpstreamError>,
}

/// Failure to obtain a usable response from the upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url: {0}")]
    InvalidUri(#[from] axum::http::uri::InvalidUri),

    #[error("invalid upstream header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// Only produced by `fetch`, after the head has arrived.
    #[error("failed to read upstream response body: {0}")]
    Body(#[source] axum::Error),

    #[error("upstream response body not received within {0:?}")]
    BodyTimeout(Duration),
}
