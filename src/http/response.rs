//! Upstream response relay.
//!
//! # Responsibilities
//! - Copy the upstream status verbatim
//! - Copy upstream headers, minus transport framing
//! - Copy the buffered upstream body byte-for-byte
//!
//! # Design Decisions
//! - `Content-Encoding` and `Transfer-Encoding` describe the upstream hop;
//!   the local HTTP stack frames the relayed bytes itself
//! - Multi-valued headers (`Link`, `Set-Cookie`) keep every value
//! - Non-2xx upstream statuses are relayed like any other response

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::Response,
};

/// Upstream headers never copied to the caller.
pub const STRIPPED_RESPONSE_HEADERS: [HeaderName; 2] =
    [header::CONTENT_ENCODING, header::TRANSFER_ENCODING];

/// Fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Upstream headers that survive the relay.
pub fn relayed_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream.iter() {
        if STRIPPED_RESPONSE_HEADERS.contains(name) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Build the outbound response from an upstream response.
pub fn relay(upstream: UpstreamResponse) -> Response {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = relayed_headers(&upstream.headers);
    response
}
