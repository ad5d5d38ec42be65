//! Content-type aware body transcoding.
//!
//! # Responsibilities
//! - Decide whether the inbound request carries a body at all
//! - Classify the declared content type
//! - Re-encode JSON through the repair cascade, pass everything else through
//!
//! # Design Decisions
//! - Only POST, PUT, PATCH and DELETE bodies are forwarded
//! - A body is read only when `content-length` is present and non-zero
//! - Read failures (including the size limit) degrade to "no body"
//! - Text that is not UTF-8 is forwarded as bytes rather than lossily decoded

use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_LENGTH, header::CONTENT_TYPE, HeaderMap, Method},
};
use bytes::Bytes;

use crate::observability::metrics;
use crate::transform::json_repair;

/// Outbound request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
    #[default]
    Absent,
}

impl Payload {
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }

    /// Size in bytes of what will be sent.
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Binary(b) => b.len(),
            Payload::Absent => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How a body of a given declared content type is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    FormUrlEncoded,
    Multipart,
    Xml,
    Text,
    Binary,
}

impl ContentKind {
    /// Classify a `content-type` value. Checks run in priority order on a
    /// lowercase copy, by substring.
    pub fn classify(content_type: Option<&str>) -> Self {
        let Some(ct) = content_type.map(str::to_ascii_lowercase) else {
            return ContentKind::Binary;
        };

        if ct.contains("application/json") || ct.contains("text/json") {
            ContentKind::Json
        } else if ct.contains("application/x-www-form-urlencoded") {
            ContentKind::FormUrlEncoded
        } else if ct.contains("multipart/form-data") {
            ContentKind::Multipart
        } else if ct.contains("xml") || ct.contains("soap") {
            ContentKind::Xml
        } else if ct.contains("text/") {
            ContentKind::Text
        } else {
            ContentKind::Binary
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Json => "json",
            ContentKind::FormUrlEncoded => "form",
            ContentKind::Multipart => "multipart",
            ContentKind::Xml => "xml",
            ContentKind::Text => "text",
            ContentKind::Binary => "binary",
        }
    }
}

/// Methods whose bodies are forwarded.
pub fn method_carries_body(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH, Method::DELETE].contains(method)
}

/// Declared `content-length`, if present and parseable.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Read and transcode the inbound body. Never fails: anything that goes wrong
/// yields [`Payload::Absent`].
pub async fn transcode_body(method: &Method, headers: &HeaderMap, body: Body, limit: usize) -> Payload {
    if !method_carries_body(method) {
        return Payload::Absent;
    }
    if !declared_length(headers).is_some_and(|len| len > 0) {
        return Payload::Absent;
    }

    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit, "Failed to read request body, forwarding without one");
            return Payload::Absent;
        }
    };

    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
    let kind = ContentKind::classify(content_type);
    tracing::debug!(kind = kind.as_str(), len = bytes.len(), "Transcoding request body");

    transcode_bytes(kind, bytes)
}

/// Transcode an already-buffered body according to its kind.
pub fn transcode_bytes(kind: ContentKind, bytes: Bytes) -> Payload {
    match kind {
        ContentKind::Json => match into_text(bytes) {
            Payload::Text(text) => transcode_json(text),
            other => other,
        },
        ContentKind::FormUrlEncoded | ContentKind::Xml | ContentKind::Text => into_text(bytes),
        ContentKind::Multipart | ContentKind::Binary => Payload::Binary(bytes),
    }
}

fn transcode_json(text: String) -> Payload {
    let Some(repaired) = json_repair::repair(&text) else {
        metrics::record_json_repair("failed");
        tracing::debug!("Forwarding unparseable JSON body unchanged");
        return Payload::Text(text);
    };

    metrics::record_json_repair(repaired.strategy);
    if repaired.strategy != "direct" {
        tracing::debug!(strategy = repaired.strategy, "Recovered malformed JSON body");
    }

    match serde_json::to_string(&repaired.value) {
        Ok(canonical) => Payload::Text(canonical),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to re-serialize JSON body, forwarding original");
            Payload::Text(text)
        }
    }
}

fn into_text(bytes: Bytes) -> Payload {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Payload::Text(text),
        Err(_) => Payload::Binary(bytes),
    }
}
