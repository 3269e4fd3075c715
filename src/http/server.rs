//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID, CORS header)
//! - Consult the admission gate before every upstream call
//! - Forward admitted requests and report their latency
//! - Run the health monitor alongside the listener

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::health::{latency_channel, HealthMonitor, LatencyReporter, LatencySample};
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::{relay, ProxyError};
use crate::observability::metrics;
use crate::resilience::{AdmissionDecision, AdmissionGate, CircuitBreaker};
use crate::upstream::{HyperUpstream, Upstream, UpstreamError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AdmissionGate>,
    pub upstream: Arc<dyn Upstream>,
    pub latency: LatencyReporter,
}

/// HTTP server for the breaker proxy.
pub struct HttpServer {
    router: Router,
    breaker: Arc<CircuitBreaker>,
    upstream: Arc<dyn Upstream>,
    samples: mpsc::Receiver<LatencySample>,
}

impl HttpServer {
    /// Create a server that talks to the configured upstream.
    pub fn new(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        let upstream = HyperUpstream::new(&config.upstream)?;
        tracing::info!(upstream = %upstream.uri(), "Upstream client ready");
        Ok(Self::with_upstream(Arc::new(upstream)))
    }

    /// Create a server around any upstream implementation.
    pub fn with_upstream(upstream: Arc<dyn Upstream>) -> Self {
        let breaker = Arc::new(CircuitBreaker::new());
        let (latency, samples) = latency_channel();

        let state = AppState {
            gate: Arc::new(AdmissionGate::new(breaker.clone())),
            upstream: upstream.clone(),
            latency,
        };

        Self {
            router: Self::build_router(state),
            breaker,
            upstream,
            samples,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(SetResponseHeaderLayer::overriding(
                        header::ACCESS_CONTROL_ALLOW_ORIGIN,
                        HeaderValue::from_static("*"),
                    )),
            )
    }

    /// The breaker shared by the gate and the monitor.
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run the server until shutdown is signalled.
    ///
    /// The health monitor starts first and stops on the same signal;
    /// in-flight requests are allowed to finish.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let monitor = HealthMonitor::new(self.breaker, self.upstream, self.samples);
        let monitor_handle = tokio::spawn(monitor.run(shutdown.resubscribe()));

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_requested(shutdown))
            .await;

        if served.is_err() {
            monitor_handle.abort();
        }
        if let Err(e) = monitor_handle.await {
            if e.is_panic() {
                tracing::error!(error = %e, "Health monitor panicked");
            }
        }

        tracing::info!("HTTP server stopped");
        served
    }
}

/// Catch-all proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request).to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        "Received request"
    );

    let response = match forward(&state, &request_id).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };

    metrics::record_request(response.status().as_u16(), start);
    response
}

async fn forward(state: &AppState, request_id: &str) -> Result<Response, ProxyError> {
    match state.gate.admit() {
        AdmissionDecision::Allow => {}
        AdmissionDecision::RejectFailure => {
            tracing::info!(request_id = %request_id, "Circuit breaker open, request rejected");
            return Err(ProxyError::BreakerOpen);
        }
        AdmissionDecision::RejectThrottled => {
            tracing::info!(request_id = %request_id, "Circuit breaker limiting traffic, request rejected");
            return Err(ProxyError::Throttled);
        }
    }

    let fetched = state.upstream.fetch().await;
    metrics::record_upstream_call("proxy", fetched.latency, fetched.outcome.as_ref().err());
    state.latency.report(fetched.latency);

    match fetched.outcome {
        Ok(upstream) => {
            tracing::debug!(
                request_id = %request_id,
                upstream_status = %upstream.status,
                latency_ms = fetched.latency.as_millis() as u64,
                bytes = upstream.body.len(),
                "Relaying upstream response"
            );
            Ok(relay(upstream))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            Err(e.into())
        }
    }
}

async fn shutdown_requested(mut shutdown: broadcast::Receiver<()>) {
    let _ = shutdown.recv().await;
    tracing::info!("Shutdown signal received, draining requests");
}
