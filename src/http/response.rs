//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a fully buffered backend response into the client response
//! - Strip hop-by-hop headers before relaying
//!
//! # Design Decisions
//! - No streaming: the body is relayed only once it is complete
//! - Status, remaining headers and body are relayed verbatim
//! - Without Transfer-Encoding the server frames the body by its length

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, Response, StatusCode};

/// Headers that only describe the backend → proxy transport leg.
pub const HOP_BY_HOP: [HeaderName; 2] = [header::TRANSFER_ENCODING, header::CONNECTION];

pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

/// Build the client response from the upstream status, headers and body.
pub fn relay(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Response<Body> {
    strip_hop_by_hop(&mut headers);

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
