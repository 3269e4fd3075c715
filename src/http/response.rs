//! Response construction.
//!
//! # Responsibilities
//! - Relay the upstream body to the caller as JSON
//! - Map rejections and upstream failures to HTTP responses
//!
//! # Design Decisions
//! - Every failure is a 500 with a plain-text body, as callers already expect
//! - The upstream's own status is not relayed; an answered call is a 200

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::upstream::{UpstreamError, UpstreamResponse};

/// Failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Breaker is open; the upstream was not contacted.
    #[error("Circuit Breaker Detected Failure")]
    BreakerOpen,

    /// Breaker is degraded and this request drew the block token.
    #[error("Circuit Breaker Limiting Traffic")]
    Throttled,

    /// Request was admitted but the upstream call failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Build the caller response for an answered upstream call.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
