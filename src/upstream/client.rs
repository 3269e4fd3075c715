//! Hyper-based upstream client.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, Response, Uri};
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::UpstreamConfig;
use crate::upstream::{Fetched, ProbeResult, Upstream, UpstreamError, UpstreamResponse};

/// Fetches the configured upstream URL over HTTP/1.1.
#[derive(Debug, Clone)]
pub struct HyperUpstream {
    client: Client<HttpConnector, Body>,
    uri: Uri,
    user_agent: HeaderValue,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl HyperUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let uri: Uri = config.url.parse()?;
        let user_agent = HeaderValue::from_str(&config.user_agent)?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            uri,
            user_agent,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// The URL every call is sent to.
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Send the GET and time it up to the response head.
    async fn timed_send(&self) -> (Duration, Result<Response<Incoming>, UpstreamError>) {
        let start = Instant::now();
        let head = self.send().await;
        (start.elapsed(), head)
    }

    async fn probe_head(&self) -> ProbeResult {
        let (latency, head) = self.timed_send().await;
        // Dropping the response discards the body unread.
        let outcome = head.map(|response| response.status());
        self.log_call("probe", latency, outcome.as_ref().err());
        ProbeResult { latency, outcome }
    }

    async fn fetch_body(&self) -> Fetched {
        let (latency, head) = self.timed_send().await;
        let outcome = match head {
            Ok(response) => self.read_body(response).await,
            Err(e) => Err(e),
        };
        self.log_call("proxy", latency, outcome.as_ref().err());
        Fetched { latency, outcome }
    }

    fn log_call(&self, kind: &'static str, latency: Duration, error: Option<&UpstreamError>) {
        match error {
            None => tracing::trace!(
                uri = %self.uri,
                kind,
                latency_ms = latency.as_millis() as u64,
                "Upstream responded"
            ),
            Some(e) => tracing::debug!(
                uri = %self.uri,
                kind,
                latency_ms = latency.as_millis() as u64,
                error = %e,
                "Upstream call failed"
            ),
        }
    }

    async fn send(&self) -> Result<Response<Incoming>, UpstreamError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(self.uri.clone())
            .header(header::USER_AGENT, self.user_agent.clone())
            .body(Body::empty())?;

        match time::timeout(self.request_timeout, self.client.request(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(UpstreamError::Timeout(self.request_timeout)),
        }
    }

    async fn read_body(&self, response: Response<Incoming>) -> Result<UpstreamResponse, UpstreamError> {
        let (parts, body) = response.into_parts();
        let read = axum::body::to_bytes(Body::new(body), self.max_body_bytes);

        match time::timeout(self.request_timeout, read).await {
            Ok(Ok(body)) => Ok(UpstreamResponse {
                status: parts.status,
                body,
            }),
            Ok(Err(e)) => Err(UpstreamError::Body(e)),
            Err(_) => Err(UpstreamError::BodyTimeout(self.request_timeout)),
        }
    }
}

impl Upstream for HyperUpstream {
    fn probe(&self) -> BoxFuture<'_, ProbeResult> {
        Box::pin(self.probe_head())
    }

    fn fetch(&self) -> BoxFuture<'_, Fetched> {
        Box::pin(self.fetch_body())
    }
}
