//! Per-request failure kinds and their JSON error envelope.
//!
//! Every failure that aborts a proxied request ends up here and is rendered as
//! `{ error, kind, details?, timestamp, targetUrl? }`. CORS headers are added by
//! the router layer, so error responses carry them like any other response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::upstream::client::{describe, InvokeError};

/// Classification of a failed proxy request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTargetUrl,
    MalformedTargetUrl,
    UpstreamTimeout,
    UpstreamUnreachable,
    ProxyInternalError,
}

impl ErrorKind {
    /// Wire name used in the `kind` field and in metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidTargetUrl => "InvalidTargetURL",
            ErrorKind::MalformedTargetUrl => "MalformedTargetURL",
            ErrorKind::UpstreamTimeout => "UpstreamTimeout",
            ErrorKind::UpstreamUnreachable => "UpstreamUnreachable",
            ErrorKind::ProxyInternalError => "ProxyInternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::InvalidTargetUrl | ErrorKind::MalformedTargetUrl => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::UpstreamUnreachable => StatusCode::BAD_GATEWAY,
            ErrorKind::ProxyInternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that fail an entire proxied request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Target segment missing or not of the form `http(s)://...`.
    #[error("Invalid target URL")]
    InvalidTargetUrl { raw: String },

    /// Target looked like a URL but did not parse, or used another scheme.
    #[error("Malformed target URL")]
    MalformedTargetUrl { raw: String, reason: String },

    /// Upstream did not answer before the deadline.
    #[error("Request timeout after {secs} seconds")]
    UpstreamTimeout { target: String, secs: u64 },

    /// DNS, connect, TLS or transport failure.
    #[error("Upstream unreachable")]
    UpstreamUnreachable { target: String, reason: String },

    /// Anything else.
    #[error("Proxy internal error")]
    Internal {
        target: Option<String>,
        reason: String,
    },
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::InvalidTargetUrl { .. } => ErrorKind::InvalidTargetUrl,
            ProxyError::MalformedTargetUrl { .. } => ErrorKind::MalformedTargetUrl,
            ProxyError::UpstreamTimeout { .. } => ErrorKind::UpstreamTimeout,
            ProxyError::UpstreamUnreachable { .. } => ErrorKind::UpstreamUnreachable,
            ProxyError::Internal { .. } => ErrorKind::ProxyInternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Human-readable detail line for the envelope.
    pub fn details(&self) -> Option<String> {
        match self {
            ProxyError::InvalidTargetUrl { .. } => {
                Some("Target URL must start with http:// or https://".to_string())
            }
            ProxyError::MalformedTargetUrl { reason, .. } => Some(reason.clone()),
            ProxyError::UpstreamTimeout { secs, .. } => Some(format!(
                "Upstream did not respond within {} seconds",
                secs
            )),
            ProxyError::UpstreamUnreachable { reason, .. } => Some(reason.clone()),
            ProxyError::Internal { reason, .. } => Some(reason.clone()),
        }
    }

    /// Target URL as seen by the proxy, when the failure happened after resolution
    /// or the raw candidate is worth echoing back.
    pub fn target_url(&self) -> Option<&str> {
        match self {
            ProxyError::InvalidTargetUrl { raw } | ProxyError::MalformedTargetUrl { raw, .. } => {
                (!raw.is_empty()).then_some(raw.as_str())
            }
            ProxyError::UpstreamTimeout { target, .. }
            | ProxyError::UpstreamUnreachable { target, .. } => Some(target.as_str()),
            ProxyError::Internal { target, .. } => target.as_deref(),
        }
    }

    /// Convert an upstream invocation failure for the given target.
    pub fn from_invoke(err: InvokeError, target: &str) -> Self {
        let target = target.to_string();
        match err {
            InvokeError::Timeout(budget) => ProxyError::UpstreamTimeout {
                target,
                secs: budget.as_secs(),
            },
            InvokeError::Network(e) => ProxyError::UpstreamUnreachable {
                target,
                reason: describe(&e),
            },
            InvokeError::Other(e) => ProxyError::Internal {
                target: Some(target),
                reason: describe(&e),
            },
        }
    }

    /// Render the JSON envelope body.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            kind: self.kind().as_str(),
            details: self.details(),
            timestamp: timestamp_now(),
            target_url: self.target_url().map(str::to_string),
        }
    }
}

/// JSON error envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

/// ISO-8601 UTC timestamp with millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.kind(), target = ?self.target_url(), details = ?self.details(), "Proxy request failed");
        } else {
            tracing::warn!(kind = %self.kind(), target = ?self.target_url(), "Rejected proxy request");
        }
        (status, Json(self.to_body())).into_response()
    }
}
