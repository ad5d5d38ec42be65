//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (strip the proxy prefix, keep the raw suffix)
//!     → target.rs (percent-decode, validate, parse)
//!     → Return: TargetUrl or InvalidTargetURL / MalformedTargetURL
//! ```
//!
//! # Design Decisions
//! - The upstream is chosen by the request alone; there is no route table
//! - Decoding failure falls back to the raw segment instead of rejecting
//! - Only http and https targets ever reach the upstream client

pub mod router;
pub mod target;

pub use router::{ProxyRoute, HEALTH_PATH};
pub use target::{resolve_target, TargetUrl};
