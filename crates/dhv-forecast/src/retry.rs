//! Bounded retry policy with exponential backoff.

use std::time::Duration;

use dhv_core::RefreshConfig;

/// Retry policy for one refresh run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RefreshConfig::default())
    }
}

impl From<&RefreshConfig> for RetryConfig {
    fn from(config: &RefreshConfig) -> Self {
        Self::new(config.max_attempts, config.initial_backoff_ms, config.max_backoff_ms)
    }
}

impl RetryConfig {
    /// A zero attempt budget is raised to one so a run always fetches at least once.
    pub fn new(max_attempts: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        }
    }

    /// Delay after the `failures`-th consecutive failure (1-based)
    pub fn delay_after(&self, failures: u32) -> Duration {
        // initial_delay * 2^(failures - 1)
        let factor = 2u64.saturating_pow(failures.saturating_sub(1));
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_refresh_config() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_delay, Duration::from_millis(2000));
        assert_eq!(config.max_delay, Duration::from_millis(60_000));
    }

    #[test]
    fn test_delay_doubles() {
        let config = RetryConfig::new(5, 100, 5000);
        assert_eq!(config.delay_after(1), Duration::from_millis(100));
        assert_eq!(config.delay_after(2), Duration::from_millis(200));
        assert_eq!(config.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig::new(10, 100, 1000);
        assert_eq!(config.delay_after(5), Duration::from_millis(1000));
        assert_eq!(config.delay_after(64), Duration::from_millis(1000));
    }

    #[test]
    fn test_zero_attempts_raised_to_one() {
        assert_eq!(RetryConfig::new(0, 0, 0).max_attempts, 1);
    }
}
