//! [RetryPolicy] bounds how often, and how patiently, the log-query API is asked.
use crate::errors::FetchFailure;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// total number of attempts, including the first one
    pub max_attempts: u32,
    /// pause after a transport error, a non-2xx status or an upstream error
    pub retry_delay: Duration,
    /// pause after the upstream explicitly reported a rate limit
    pub rate_limit_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            rate_limit_delay: DEFAULT_RATE_LIMIT_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries `max_attempts` times back to back.
    pub fn without_delay(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            retry_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
        }
    }

    /// At least one attempt is always made.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }

    /// Pause before retrying after `failure`.
    pub fn delay_for(&self, failure: &FetchFailure) -> Duration {
        match failure {
            FetchFailure::RateLimited(_) => self.rate_limit_delay,
            _ => self.retry_delay,
        }
    }
}
