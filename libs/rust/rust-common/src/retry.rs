//! Refresh scheduling with exponential failure backoff.
//!
//! A periodic job (such as renewing a service credential) runs at a steady
//! interval while it succeeds. On failure it retries sooner, starting at a
//! small delay and doubling on each consecutive failure up to a cap. The
//! first success returns the schedule to the steady interval and resets the
//! backoff.

use std::time::Duration;

/// Delay before the first retry after a failure.
pub const FIRST_FAILURE_BACKOFF: Duration = Duration::from_secs(1);

/// Upper bound for the delay between consecutive failed attempts.
pub const MAX_FAILURE_BACKOFF: Duration = Duration::from_secs(60);

/// Backoff schedule configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Interval between attempts while they succeed
    pub steady_interval: Duration,
    /// Delay after the first failure
    pub first_failure: Duration,
    /// Cap for consecutive-failure delays
    pub max_failure: Duration,
}

impl BackoffConfig {
    /// Create a config with the given steady interval and default failure
    /// delays.
    #[must_use]
    pub const fn new(steady_interval: Duration) -> Self {
        Self {
            steady_interval,
            first_failure: FIRST_FAILURE_BACKOFF,
            max_failure: MAX_FAILURE_BACKOFF,
        }
    }

    /// Set the delay after the first failure.
    #[must_use]
    pub const fn with_first_failure(mut self, delay: Duration) -> Self {
        self.first_failure = delay;
        self
    }

    /// Set the cap for consecutive-failure delays.
    #[must_use]
    pub const fn with_max_failure(mut self, delay: Duration) -> Self {
        self.max_failure = delay;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initial,
    Steady,
    BackingOff(Duration),
}

/// Stateful schedule that yields the delay before the next attempt.
///
/// # Examples
///
/// ```
/// use rust_common::{BackoffConfig, FailureBackoff};
/// use std::time::Duration;
///
/// let mut backoff = FailureBackoff::new(BackoffConfig::new(Duration::from_secs(3600)));
/// assert_eq!(backoff.on_failure(), Duration::from_secs(1));
/// assert_eq!(backoff.on_failure(), Duration::from_secs(2));
/// assert_eq!(backoff.on_success(), Duration::from_secs(3600));
/// assert_eq!(backoff.on_failure(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct FailureBackoff {
    config: BackoffConfig,
    phase: Phase,
}

impl FailureBackoff {
    /// Create a schedule that has not observed any attempt yet.
    #[must_use]
    pub const fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            phase: Phase::Initial,
        }
    }

    /// Record a successful attempt and return the delay before the next one.
    pub const fn on_success(&mut self) -> Duration {
        self.phase = Phase::Steady;
        self.config.steady_interval
    }

    /// Record a failed attempt and return the delay before the next one.
    pub fn on_failure(&mut self) -> Duration {
        let delay = match self.phase {
            Phase::Initial | Phase::Steady => self.config.first_failure,
            Phase::BackingOff(previous) => previous
                .checked_mul(2)
                .unwrap_or(self.config.max_failure)
                .min(self.config.max_failure),
        };
        self.phase = Phase::BackingOff(delay);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hourly() -> FailureBackoff {
        FailureBackoff::new(BackoffConfig::new(Duration::from_secs(3600)))
    }

    #[test]
    fn test_default_config() {
        let config = BackoffConfig::new(Duration::from_secs(3600));
        assert_eq!(config.first_failure, Duration::from_secs(1));
        assert_eq!(config.max_failure, Duration::from_secs(60));
    }

    #[test]
    fn test_consecutive_failures_double_until_cap() {
        let mut backoff = hourly();
        let delays: Vec<u64> = (0..9).map(|_| backoff.on_failure().as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60]);
    }

    #[test]
    fn test_success_resets_failure_delay() {
        let mut backoff = hourly();
        backoff.on_failure();
        backoff.on_failure();
        backoff.on_failure();

        assert_eq!(backoff.on_success(), Duration::from_secs(3600));
        assert_eq!(backoff.on_failure(), Duration::from_secs(1));
    }

    #[test]
    fn test_steady_interval_equal_to_backoff_step() {
        // A steady interval of 2s must still restart failures at 1s.
        let mut backoff = FailureBackoff::new(BackoffConfig::new(Duration::from_secs(2)));
        assert_eq!(backoff.on_failure(), Duration::from_secs(1));
        assert_eq!(backoff.on_failure(), Duration::from_secs(2));
        assert_eq!(backoff.on_success(), Duration::from_secs(2));
        assert_eq!(backoff.on_failure(), Duration::from_secs(1));
    }

    #[test]
    fn test_custom_delays() {
        let config = BackoffConfig::new(Duration::from_secs(10))
            .with_first_failure(Duration::from_millis(100))
            .with_max_failure(Duration::from_millis(250));
        let mut backoff = FailureBackoff::new(config);

        assert_eq!(backoff.on_failure(), Duration::from_millis(100));
        assert_eq!(backoff.on_failure(), Duration::from_millis(200));
        assert_eq!(backoff.on_failure(), Duration::from_millis(250));
    }
}
