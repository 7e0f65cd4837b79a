use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Polling configuration for subscriptions, funding, and timeout waits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Subscription poll interval (milliseconds).
    pub poll_interval_ms: u64,
    /// Funding-completion poll interval (milliseconds).
    pub funding_poll_interval_ms: u64,
    /// Granularity of timeout re-checks (milliseconds).
    pub timeout_granularity_ms: u64,
}

impl PollConfig {
    /// Subscription poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Funding-completion poll interval.
    pub fn funding_poll_interval(&self) -> Duration {
        Duration::from_millis(self.funding_poll_interval_ms)
    }

    /// Granularity of timeout re-checks.
    pub fn timeout_granularity(&self) -> Duration {
        Duration::from_millis(self.timeout_granularity_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
            funding_poll_interval_ms: 200,
            timeout_granularity_ms: 100,
        }
    }
}
