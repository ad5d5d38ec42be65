//! Timeout enforcement.
//!
//! # Responsibilities
//! - Carry an explicit per-request deadline into the upstream call
//! - Cancel the in-flight call when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future releases the connection
//! - Timeout is reported separately from every other failure
//! - Timed-out requests return 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;

use tokio::time::{error::Elapsed, Instant};

/// Absolute point in time by which an operation must complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Total time allowed when the deadline was created.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before expiry (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Drive `fut` to completion or give up at the deadline.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout_at(self.at, fut).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_within_budget() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let out = deadline.run(async { 42 }).await;
        assert_eq!(out.unwrap(), 42);
        assert!(!deadline.is_expired());
        assert!(deadline.remaining() <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_expires() {
        let deadline = Deadline::after(Duration::from_millis(50));
        let out = deadline
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(out.is_err());
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert_eq!(deadline.budget(), Duration::from_millis(50));
    }
}
