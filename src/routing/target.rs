//! Target URL extraction and validation.
//!
//! The path segment after the proxy prefix is the upstream URL itself, usually
//! percent-encoded by the caller. Resolution decodes it, checks the overall
//! shape, then parses it for real.

use std::borrow::Cow;
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::error::ProxyError;

static TARGET_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+").expect("target pattern is valid"));

/// A validated absolute upstream URL (http or https only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    url: Url,
}

impl TargetUrl {
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host name without port.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Value for the outbound `Host` header: host plus explicit non-default port.
    pub fn host_header(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }
}

impl std::fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Percent-decode a raw target segment, keeping it verbatim when the decoded
/// bytes are not UTF-8.
pub fn decode_segment(raw: &str) -> Cow<'_, str> {
    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::debug!(error = %e, "Target segment is not valid UTF-8 once decoded, using raw form");
            Cow::Borrowed(raw)
        }
    }
}

/// Resolve the raw path segment (and the inbound query string, if any) into a
/// validated target.
pub fn resolve_target(raw_segment: &str, query: Option<&str>) -> Result<TargetUrl, ProxyError> {
    let decoded = decode_segment(raw_segment);

    let mut candidate = decoded.into_owned();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        candidate.push(if candidate.contains('?') { '&' } else { '?' });
        candidate.push_str(query);
    }

    if !TARGET_SHAPE.is_match(&candidate) {
        return Err(ProxyError::InvalidTargetUrl { raw: candidate });
    }

    let url = Url::parse(&candidate).map_err(|e| ProxyError::MalformedTargetUrl {
        raw: candidate.clone(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ProxyError::MalformedTargetUrl {
                raw: candidate.clone(),
                reason: format!("Unsupported scheme: {}", other),
            })
        }
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ProxyError::MalformedTargetUrl {
            raw: candidate,
            reason: "Target URL has no host".to_string(),
        });
    }

    Ok(TargetUrl { url })
}
