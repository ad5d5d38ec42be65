//! Response reconstruction.
//!
//! # Responsibilities
//! - Turn a buffered upstream response into the client response
//! - Strip hop-by-hop headers the upstream sent
//! - Define the CORS header set applied to every response
//! - Answer preflight requests without touching the upstream
//!
//! # Design Decisions
//! - The response body is relayed byte for byte, never re-encoded
//! - CORS headers are applied by a router layer so error responses get them too
//! - A non-canonical upstream reason phrase is kept (HTTP/1.1 only)

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
            ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE,
        },
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::Response,
};

use crate::upstream::UpstreamResponse;

/// Upstream response headers never relayed to the client.
pub const RESPONSE_HEADER_EXCLUSIONS: &[&str] = &["transfer-encoding", "connection", "keep-alive"];

/// Headers set on every response, overriding upstream values.
pub const CORS_HEADERS: [(HeaderName, &str); 5] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        ACCESS_CONTROL_ALLOW_METHODS,
        "GET, POST, PUT, DELETE, PATCH, OPTIONS, HEAD",
    ),
    (ACCESS_CONTROL_ALLOW_HEADERS, "*"),
    (ACCESS_CONTROL_EXPOSE_HEADERS, "*"),
    (ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
];

/// Preflight cache lifetime in seconds.
pub const PREFLIGHT_MAX_AGE: &str = "86400";

/// Copy upstream headers, skipping the excluded ones.
pub fn filter_response_headers(upstream: &HeaderMap, excluded: &[&str]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len() + CORS_HEADERS.len());
    for (name, value) in upstream.iter() {
        if excluded.iter().any(|e| e.eq_ignore_ascii_case(name.as_str())) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Build the client response from a buffered upstream response.
pub fn rebuild_response(upstream: UpstreamResponse) -> Response {
    let UpstreamResponse {
        status,
        reason,
        headers,
        body,
    } = upstream;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = filter_response_headers(&headers, RESPONSE_HEADER_EXCLUSIONS);
    if let Some(reason) = reason {
        response.extensions_mut().insert(reason);
    }
    response
}

/// Response to an `OPTIONS` request on a proxy path.
pub fn preflight_response() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(PREFLIGHT_MAX_AGE));
    response
}
