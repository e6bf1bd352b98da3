//! Bounded retry policy with capped exponential backoff.

use std::time::Duration;

use serde::Deserialize;

/// How many times a failed operation is attempted and how long to wait
/// between attempts.
///
/// The delay before attempt `n + 1` is `initial_delay * multiplier^(n - 1)`,
/// capped at `max_delay`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero behaves as one.
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Growth factor applied after each failure.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries once and never waits.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay_ms: 0,
            max_delay_ms: 0,
            multiplier: 1,
        }
    }

    /// Attempts allowed, never less than one.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = u64::from(self.multiplier.max(1)).saturating_pow(exponent);
        let millis = self
            .initial_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }

    /// Longest time one item can spend waiting between its attempts before
    /// the policy gives up.
    #[must_use]
    pub fn worst_case_delay(&self) -> Duration {
        (1..self.attempts())
            .map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_have_sensible_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay_ms, 500);
        assert_eq!(policy.max_delay_ms, 30_000);
        assert_eq!(policy.multiplier, 2);
    }

    #[test]
    fn should_grow_delay_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_millis(500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay_after(3), Duration::from_millis(2_000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(4_000));
    }

    #[test]
    fn should_cap_delay_at_max() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(10), Duration::from_secs(30));
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn should_stop_after_max_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..RetryPolicy::default()
        };
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn should_attempt_at_least_once_when_configured_with_zero() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.should_retry(1));
    }

    #[test]
    fn should_never_wait_without_retry() {
        let policy = RetryPolicy::no_retry();
        assert_eq!(policy.delay_after(1), Duration::ZERO);
        assert!(!policy.should_retry(1));
    }

    #[test]
    fn should_sum_every_backoff_delay_for_worst_case() {
        assert_eq!(
            RetryPolicy::default().worst_case_delay(),
            Duration::from_millis(500 + 1_000 + 2_000 + 4_000)
        );
        assert_eq!(RetryPolicy::no_retry().worst_case_delay(), Duration::ZERO);

        let capped = RetryPolicy {
            max_attempts: 4,
            initial_delay_ms: 20_000,
            max_delay_ms: 30_000,
            multiplier: 2,
        };
        assert_eq!(capped.worst_case_delay(), Duration::from_secs(20 + 30 + 30));
    }

    #[test]
    fn should_deserialize_from_toml_with_defaults() {
        let policy: RetryPolicy = toml::from_str("max_attempts = 8").unwrap();
        assert_eq!(policy.max_attempts, 8);
        assert_eq!(policy.initial_delay_ms, 500);
    }
}
