use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::AdjudicatorError;

/// An absolute deadline with a polling granularity.
///
/// `wait` re-checks the clock at the granularity instead of sleeping the
/// whole distance, so waits stay responsive to clock adjustments and never
/// overshoot the deadline by more than one granularity step.
#[derive(Debug, Clone)]
pub struct Timeout {
    deadline: DateTime<Utc>,
    granularity: Duration,
}

impl Timeout {
    /// Create a timeout for an absolute deadline.
    pub fn new(deadline: DateTime<Utc>, granularity: Duration) -> Self {
        Self {
            deadline,
            granularity,
        }
    }

    /// The absolute deadline.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// Whether the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        Utc::now() >= self.deadline
    }

    /// Wait until the deadline passes, or fail with `Cancelled` if the token
    /// fires first. Returns immediately when the deadline already passed.
    pub async fn wait(&self, cancel: &CancelToken) -> Result<(), AdjudicatorError> {
        while !self.is_elapsed() {
            tokio::select! {
                _ = tokio::time::sleep(self.granularity) => {}
                _ = cancel.cancelled() => return Err(AdjudicatorError::Cancelled),
            }
        }
        Ok(())
    }
}
