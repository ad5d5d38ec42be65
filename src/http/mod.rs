//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers, handlers)
//!     → request.rs (request ID)
//!     → routing (target resolution) → transform (headers, body)
//!     → upstream (buffered call)
//!     → response.rs (filter headers, relay status and bytes)
//!     → CORS layer → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{build_router, AppState, HttpServer};
