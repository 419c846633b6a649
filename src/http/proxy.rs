//! Per-request proxy pipeline.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → selector (next healthy backend, or 503 without any upstream I/O)
//!     → request.rs (capture context, drop Host, address the backend)
//!     → hyper client, bounded by the end-to-end timeout
//!     → response.rs (buffer body, strip hop-by-hop headers)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Single attempt: a failed upstream call is never retried elsewhere
//! - Transport failures and timeouts become 502 with a short diagnostic
//! - Nothing from a failed upstream response reaches the client

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::request::RequestContext;
use crate::http::response::relay;
use crate::load_balancer::{Backend, Selector};
use crate::observability::metrics;

/// Every way a proxied request can fail, each mapped to one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("No healthy backend servers available.")]
    NoHealthyBackend,

    #[error("Bad Gateway or connection error: {backend}: {reason}")]
    UpstreamUnreachable { backend: String, reason: String },

    #[error("Bad Gateway: {backend} did not respond within {timeout:?}")]
    UpstreamTimeout { backend: String, timeout: Duration },

    #[error("Bad Gateway: cannot address upstream {uri}: {reason}")]
    InvalidUpstreamUri { uri: String, reason: String },

    #[error("Request body exceeds {0} bytes")]
    BodyTooLarge(usize),

    #[error("Failed to read request body: {0}")]
    InvalidRequestBody(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::UpstreamUnreachable { .. }
            | ProxyError::UpstreamTimeout { .. }
            | ProxyError::InvalidUpstreamUri { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// True if the selected backend was actually contacted.
    pub fn reached_upstream(&self) -> bool {
        matches!(
            self,
            ProxyError::UpstreamUnreachable { .. } | ProxyError::UpstreamTimeout { .. }
        )
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Selects a backend and relays one request to it.
pub struct ProxyHandler {
    selector: Selector,
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
    max_body_bytes: usize,
}

impl ProxyHandler {
    pub fn new(selector: Selector, request_timeout: Duration, max_body_bytes: usize) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            selector,
            client,
            request_timeout,
            max_body_bytes,
        }
    }

    /// Forward `request` and map every failure to a client response.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let method = request.method().to_string();

        let backend = self.selector.next();
        let result = match &backend {
            Some(b) => self.forward_to(b, request).await,
            None => Err(ProxyError::NoHealthyBackend),
        };

        // Requests rejected before any upstream I/O are not charged to a backend.
        let label = match (&backend, &result) {
            (Some(b), Ok(_)) => b.base(),
            (Some(b), Err(e)) if e.reached_upstream() => b.base(),
            _ => "none",
        };
        let label = label.to_string();

        let response = result.unwrap_or_else(|e| {
            match &e {
                ProxyError::NoHealthyBackend => tracing::warn!("No healthy backends"),
                ProxyError::BodyTooLarge(_) | ProxyError::InvalidRequestBody(_) => {
                    tracing::debug!(error = %e, "Rejected request")
                }
                _ => tracing::error!(error = %e, "Upstream error"),
            }
            e.into_response()
        });

        metrics::record_request(&method, response.status().as_u16(), &label, start);
        response
    }

    async fn forward_to(&self, backend: &Backend, request: Request<Body>) -> Result<Response, ProxyError> {
        let context = RequestContext::capture(request, self.max_body_bytes).await?;
        let upstream = context.to_upstream(backend)?;

        tracing::debug!(
            backend = %backend.url,
            method = %context.method,
            path = %context.path,
            "Forwarding request"
        );

        match tokio::time::timeout(self.request_timeout, self.exchange(upstream)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(reason)) => Err(ProxyError::UpstreamUnreachable {
                backend: backend.base().to_string(),
                reason,
            }),
            Err(_) => Err(ProxyError::UpstreamTimeout {
                backend: backend.base().to_string(),
                timeout: self.request_timeout,
            }),
        }
    }

    /// Send the request and buffer the complete response.
    async fn exchange(&self, upstream: Request<Body>) -> Result<Response, String> {
        let response: hyper::Response<Incoming> =
            self.client.request(upstream).await.map_err(|e| describe(&e))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), usize::MAX)
            .await
            .map_err(|e| describe(&e))?;

        Ok(relay(parts.status, parts.headers, body))
    }
}

/// Error message followed by its sources; hyper's top-level messages are terse.
fn describe(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        message.push_str(": ");
        message.push_str(&e.to_string());
        source = e.source();
    }
    message
}
