//! Outbound header translation.
//!
//! # Responsibilities
//! - Strip hop-by-hop and host-identifying headers from the inbound set
//! - Copy everything else verbatim, repeated values included
//! - Point `Host` at the target and make sure a `User-Agent` is present
//! - Force caching off for proxied content

use axum::http::{
    header::{CACHE_CONTROL, EXPIRES, HOST, PRAGMA, USER_AGENT},
    HeaderMap, HeaderName, HeaderValue,
};

use crate::routing::TargetUrl;

/// Inbound headers never forwarded upstream.
pub const REQUEST_HEADER_EXCLUSIONS: &[&str] = &[
    "host",
    "connection",
    "transfer-encoding",
    "content-length",
    "content-encoding",
    "accept-encoding",
];

/// Headers set on every outbound request, overriding inbound values.
pub const CACHE_BUSTING_HEADERS: [(HeaderName, &str); 3] = [
    (CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
    (PRAGMA, "no-cache"),
    (EXPIRES, "0"),
];

/// User agent sent when the caller did not supply one.
pub const DEFAULT_USER_AGENT: &str = concat!("cors-relay/", env!("CARGO_PKG_VERSION"));

/// Filtering policy for the translator.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    /// Lowercase header names to drop.
    pub excluded: &'static [&'static str],
    /// Fallback `User-Agent` value.
    pub default_user_agent: String,
}

impl HeaderPolicy {
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            excluded: REQUEST_HEADER_EXCLUSIONS,
            default_user_agent: user_agent.into(),
        }
    }

    pub fn is_excluded(&self, name: &HeaderName) -> bool {
        // HeaderName is always lowercase.
        self.excluded.iter().any(|e| e.eq_ignore_ascii_case(name.as_str()))
    }
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }
}

/// Build the outbound header set for `target` from the inbound headers.
pub fn translate_request_headers(
    inbound: &HeaderMap,
    target: &TargetUrl,
    policy: &HeaderPolicy,
) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.len() + 5);

    for (name, value) in inbound.iter() {
        if policy.is_excluded(name) {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    match HeaderValue::from_str(&target.host_header()) {
        Ok(host) => {
            outbound.insert(HOST, host);
        }
        Err(e) => {
            tracing::warn!(host = %target.host_header(), error = %e, "Skipping unrepresentable Host header");
        }
    }

    if !inbound.contains_key(USER_AGENT) {
        match HeaderValue::from_str(&policy.default_user_agent) {
            Ok(ua) => {
                outbound.insert(USER_AGENT, ua);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Skipping invalid default User-Agent");
            }
        }
    }

    for (name, value) in CACHE_BUSTING_HEADERS {
        outbound.insert(name, HeaderValue::from_static(value));
    }

    outbound
}
