//! CORS relay library.
//!
//! Forwards `/<prefix>/<target-url>` requests to the embedded target and relays
//! the answer with permissive CORS headers.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod transform;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::{ErrorKind, ProxyError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
