//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (one deadline for connect, send and body read)
//!     → On expiry: future dropped, 504 returned
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - No retries: failures surface immediately and callers decide what to do

pub mod timeouts;

pub use timeouts::Deadline;
