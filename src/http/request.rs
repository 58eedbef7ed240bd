//! Inbound request preparation.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) when the caller did not send one
//! - Enforce the forwarded method set
//! - Extract the caller's credential without inspecting it
//! - Buffer the body for state-changing methods, within the size limit
//!
//! # Design Decisions
//! - GET/HEAD bodies are never read, so they can never be forwarded
//! - A declared Content-Length over the limit is rejected before reading
//! - The credential is marked sensitive and never logged

use std::error::Error as StdError;

use axum::{
    body::{Body, Bytes},
    http::{
        header::{AUTHORIZATION, CONTENT_LENGTH},
        HeaderMap, HeaderValue, Method, Request,
    },
};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::error::ProxyError;

/// Header carrying the request ID, in and out.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Methods the proxy relays.
pub const FORWARDED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::HEAD,
];

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of an inbound request, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

pub fn check_method(method: &Method) -> Result<(), ProxyError> {
    if FORWARDED_METHODS.contains(method) {
        Ok(())
    } else {
        Err(ProxyError::MethodNotAllowed(method.clone()))
    }
}

/// Methods whose body is forwarded.
pub fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

/// The caller's Authorization header, verbatim. Blank counts as absent.
pub fn credential(headers: &HeaderMap) -> Result<HeaderValue, ProxyError> {
    let value = headers
        .get(AUTHORIZATION)
        .filter(|v| !v.as_bytes().iter().all(u8::is_ascii_whitespace))
        .ok_or(ProxyError::Unauthenticated)?;

    let mut value = value.clone();
    value.set_sensitive(true);
    Ok(value)
}

/// Buffer the inbound body if `method` carries one.
///
/// Returns `None` for GET/HEAD and for empty bodies.
pub async fn read_body(
    method: &Method,
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Option<Bytes>, ProxyError> {
    if !carries_body(method) {
        return Ok(None);
    }

    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(ProxyError::PayloadTooLarge { limit });
    }

    match axum::body::to_bytes(body, limit).await {
        Ok(bytes) if bytes.is_empty() => Ok(None),
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) => {
            let inner = e.into_inner();
            if exceeds_limit(&*inner) {
                Err(ProxyError::PayloadTooLarge { limit })
            } else {
                Err(ProxyError::InvalidBody(inner.to_string()))
            }
        }
    }
}

fn exceeds_limit(err: &(dyn StdError + Send + Sync + 'static)) -> bool {
    let mut current: &(dyn StdError + 'static) = err;
    loop {
        if current.is::<LengthLimitError>() {
            return true;
        }
        match current.source() {
            Some(next) => current = next,
            None => return false,
        }
    }
}
