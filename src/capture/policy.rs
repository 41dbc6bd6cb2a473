//! Dropped-frame retry policy

use std::time::Duration;

use crate::config::CameraConfig;

/// What the capture loop does after a failed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep, then read again
    Retry(Duration),
    /// Declare the device unavailable
    GiveUp,
}

/// Fixed-backoff retry with an optional consecutive-failure limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Wait before the next read
    pub backoff: Duration,
    /// Consecutive failures tolerated (`None` = retry forever)
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(100),
            max_consecutive_failures: None,
        }
    }
}

impl RetryPolicy {
    /// Policy from camera settings
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            backoff: config.retry_backoff(),
            max_consecutive_failures: config.max_consecutive_failures,
        }
    }

    /// Set the backoff
    pub fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Give up after `max` consecutive failures
    pub fn max_consecutive_failures(mut self, max: u32) -> Self {
        self.max_consecutive_failures = Some(max);
        self
    }

    /// Decide after the `consecutive`-th failure in a row
    pub fn on_failure(&self, consecutive: u32) -> RetryDecision {
        match self.max_consecutive_failures {
            Some(max) if consecutive >= max => RetryDecision::GiveUp,
            _ => RetryDecision::Retry(self.backoff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retries_forever() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.on_failure(1), RetryDecision::Retry(Duration::from_millis(100)));
        assert_eq!(
            policy.on_failure(u32::MAX),
            RetryDecision::Retry(Duration::from_millis(100))
        );
    }

    #[test]
    fn test_limit() {
        let policy = RetryPolicy::default()
            .backoff(Duration::from_millis(5))
            .max_consecutive_failures(3);

        assert_eq!(policy.on_failure(2), RetryDecision::Retry(Duration::from_millis(5)));
        assert_eq!(policy.on_failure(3), RetryDecision::GiveUp);
    }

    #[test]
    fn test_from_config() {
        let config = CameraConfig {
            retry_backoff_ms: 250,
            max_consecutive_failures: Some(10),
            ..CameraConfig::default()
        };
        let policy = RetryPolicy::from_config(&config);

        assert_eq!(policy.backoff, Duration::from_millis(250));
        assert_eq!(policy.max_consecutive_failures, Some(10));
    }
}
