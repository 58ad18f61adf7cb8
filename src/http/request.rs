//! Request preparation for forwarding.
//!
//! # Responsibilities
//! - Generate and propagate a unique request ID (UUID v4)
//! - Strip hop-by-hop headers in both directions
//! - Decide whether a request carries a body worth streaming
//! - Stamp forwarded requests with `Via` and spot requests that loop back
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - `Host` is dropped on the way out; the client derives it from the
//!   (possibly rewritten) upstream URL

use std::collections::HashSet;

use axum::body::{Body, HttpBody};
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Layer that assigns an `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Read the request ID assigned by [`set_request_id_layer`].
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Headers to send upstream.
pub fn upstream_headers(headers: &HeaderMap) -> HeaderMap {
    let mut rewritten = strip_hop_by_hop(headers);
    rewritten.remove(header::HOST);
    rewritten
}

/// Headers to send back to the client.
pub fn downstream_headers(headers: &HeaderMap) -> HeaderMap {
    strip_hop_by_hop(headers)
}

/// True unless the body is known to be empty.
///
/// Asks the body itself, so HTTP/2 streams without `content-length` still count.
pub fn has_body(body: &Body) -> bool {
    !body.is_end_stream() && body.size_hint().exact() != Some(0)
}

/// A `Via` entry unique to this proxy instance.
pub fn proxy_via() -> HeaderValue {
    let entry = format!("1.1 {}-{}", env!("CARGO_PKG_NAME"), Uuid::new_v4().simple());
    HeaderValue::from_str(&entry).unwrap_or_else(|_| HeaderValue::from_static("1.1 mock-redirect-proxy"))
}

/// True when `via` already appears in the request's `Via` chain.
pub fn is_looping(headers: &HeaderMap, via: &HeaderValue) -> bool {
    let Ok(ours) = via.to_str() else {
        return false;
    };
    headers
        .get_all(header::VIA)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|entry| entry.trim() == ours)
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let blocked = blocked_header_names(headers);

    let mut rewritten = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if blocked.contains(name) {
            continue;
        }
        rewritten.append(name.clone(), value.clone());
    }
    rewritten
}

fn blocked_header_names(headers: &HeaderMap) -> HashSet<HeaderName> {
    let mut blocked: HashSet<HeaderName> = HOP_BY_HOP_HEADERS
        .iter()
        .map(|&name| HeaderName::from_static(name))
        .collect();

    // Headers named in `Connection` are hop-by-hop too.
    for value in headers.get_all(header::CONNECTION) {
        let Ok(raw) = value.to_str() else {
            continue;
        };
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if let Ok(name) = HeaderName::from_bytes(token.to_ascii_lowercase().as_bytes()) {
                blocked.insert(name);
            }
        }
    }
    blocked
}
