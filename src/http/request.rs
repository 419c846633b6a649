//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Capture the inbound request once: method, path, query, headers, body
//! - Build the upstream request for the selected backend
//!
//! # Design Decisions
//! - The client's Host header is never forwarded; the HTTP client sets
//!   Host from the backend authority
//! - Everything else is forwarded verbatim
//! - The body is fully buffered (bounded) before forwarding

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request};
use bytes::BytesMut;
use futures_util::StreamExt;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::proxy::ProxyError;
use crate::load_balancer::Backend;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Everything forwarded upstream for one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Inbound headers minus `Host`.
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RequestContext {
    /// Consume the inbound request, buffering at most `max_body_bytes`.
    pub async fn capture(request: Request<Body>, max_body_bytes: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();

        let body = read_body(body, max_body_bytes).await?;

        let mut headers = parts.headers;
        headers.remove(header::HOST);

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers,
            body,
        })
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// Request addressed to `backend`, carrying the captured method, headers and body.
    pub fn to_upstream(&self, backend: &Backend) -> Result<Request<Body>, ProxyError> {
        let uri = backend.endpoint(&self.path_and_query());

        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(uri.as_str())
            .body(Body::from(self.body.clone()))
            .map_err(|e| ProxyError::InvalidUpstreamUri {
                uri: uri.clone(),
                reason: e.to_string(),
            })?;
        *request.headers_mut() = self.headers.clone();

        Ok(request)
    }
}

/// Buffer `body`, failing with `BodyTooLarge` as soon as it exceeds `limit`
/// whether or not a length was declared.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, ProxyError> {
    // Declared or known sizes are rejected before reading anything.
    if body.size_hint().lower() > limit as u64 {
        return Err(ProxyError::BodyTooLarge(limit));
    }

    let mut buffer = BytesMut::new();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProxyError::InvalidRequestBody(e.to_string()))?;
        if buffer.len() + chunk.len() > limit {
            return Err(ProxyError::BodyTooLarge(limit));
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}
