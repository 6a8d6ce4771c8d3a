//! [Clock] supplies the validation time, [FreshnessPolicy] decides whether a claim is recent.
use crate::errors::{ClaimRejection, RejectionReason};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 3600);
pub const DEFAULT_MAX_FUTURE_SKEW: Duration = Duration::from_secs(5 * 60);

pub trait Clock: Send + Sync {
    /// current time in unix seconds
    fn now(&self) -> u64;
}

/// Wall clock of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs(),
            Err(e) => {
                warn!(target: "claim_validator", "system clock is before unix epoch: {e}");
                0
            }
        }
    }
}

/// [FixedClock] always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    /// a claim this old or older is expired
    pub max_age: Duration,
    /// how far ahead of the validation time a claim may be dated
    pub max_future_skew: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            max_future_skew: DEFAULT_MAX_FUTURE_SKEW,
        }
    }
}

impl FreshnessPolicy {
    pub fn check(&self, timestamp: u64, now: u64) -> Result<(), ClaimRejection> {
        let max_age = self.max_age.as_secs();
        let max_skew = self.max_future_skew.as_secs();

        if let Some(age) = now.checked_sub(timestamp) {
            if age >= max_age {
                return Err(ClaimRejection::new(
                    RejectionReason::Expired,
                    format!("claim is {age}s old, maximum is {max_age}s"),
                ));
            }
        }
        if timestamp > now.saturating_add(max_skew) {
            return Err(ClaimRejection::new(
                RejectionReason::FutureTimestamp,
                format!("claim is dated {timestamp}, validation time is {now}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const NOW: u64 = 1_750_000_000;

    #[rstest]
    #[case::brand_new(NOW, None)]
    #[case::one_second_short_of_max_age(NOW - 24 * 3600 + 1, None)]
    #[case::exactly_max_age(NOW - 24 * 3600, Some(RejectionReason::Expired))]
    #[case::way_too_old(1, Some(RejectionReason::Expired))]
    #[case::within_skew(NOW + 299, None)]
    #[case::at_skew(NOW + 300, None)]
    #[case::beyond_skew(NOW + 301, Some(RejectionReason::FutureTimestamp))]
    fn test_freshness_boundaries(#[case] timestamp: u64, #[case] expected: Option<RejectionReason>) {
        let verdict = FreshnessPolicy::default().check(timestamp, NOW);
        assert_eq!(verdict.err().map(|r| r.reason), expected);
    }

    #[test]
    fn test_custom_max_age() {
        let policy = FreshnessPolicy {
            max_age: Duration::from_secs(60),
            ..Default::default()
        };
        assert!(policy.check(NOW - 59, NOW).is_ok());
        assert!(policy.check(NOW - 60, NOW).is_err());
    }

    #[test]
    fn test_system_clock_is_after_2024() {
        assert!(SystemClock.now() > 1_704_067_200);
    }
}
