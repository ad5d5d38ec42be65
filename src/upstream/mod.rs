//! Upstream invocation subsystem.
//!
//! # Data Flow
//! ```text
//! OutboundRequest (method, target, translated headers, payload)
//!     + Deadline
//!     → client.rs (send, follow redirects, buffer the body)
//!     → UpstreamResponse | InvokeError::{Timeout, Network, Other}
//! ```
//!
//! # Design Decisions
//! - One shared client, but idle connections are never kept (no pooling)
//! - The deadline covers connect, send and the full body read
//! - Failures are classified here so the HTTP layer only maps them to statuses

pub mod client;

pub use client::{InvokeError, OutboundRequest, UpstreamClient, UpstreamResponse};
