//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! http/server.rs, transform/body.rs, upstream failures
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every log line through the trace span
//! - Metric updates are no-ops until a recorder is installed
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod metrics;
