//! Request transformation subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request parts
//!     → headers.rs (drop excluded headers, force Host / User-Agent / no-cache)
//!     → body.rs (pick a strategy by method + content type)
//!         → json_repair.rs (JSON bodies only: ordered repair cascade)
//!     → OutboundRequest headers + Payload
//! ```
//!
//! # Design Decisions
//! - Filtering policy is data (constant slices) handed to the translator
//! - A bad header or an unreadable body never fails the request
//! - Only JSON bodies are re-encoded; everything else is forwarded as received

pub mod body;
pub mod headers;
pub mod json_repair;

pub use body::{transcode_body, ContentKind, Payload};
pub use headers::{translate_request_headers, HeaderPolicy};
