//! Retry policy with a fixed delay.
//!
//! Attempts are strictly sequential: each one may trigger an on-chain fee
//! settlement, which must not race with another attempt of the same request.
//! The delay is a plain `tokio::time::sleep`, local to the calling task.

use std::time::Duration;
use tracing::debug;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (not retries after the first)
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
    /// Bound on a single attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

/// Retry policy implementation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration.
    ///
    /// A zero attempt budget is raised to one.
    #[must_use]
    pub fn new(mut config: RetryConfig) -> Self {
        config.max_attempts = config.max_attempts.max(1);
        Self { config }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    /// Create a policy with a custom attempt budget
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(RetryConfig {
            max_attempts,
            ..Default::default()
        })
    }

    /// Maximum number of attempts
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Whether another attempt may follow attempt number `attempt` (1-indexed)
    #[must_use]
    pub fn has_next(&self, attempt: u32) -> bool {
        attempt < self.config.max_attempts
    }

    /// Delay before the attempt following `attempt`
    #[must_use]
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        self.config.delay
    }

    /// Bound on a single attempt
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        self.config.attempt_timeout
    }

    /// Sleep for the inter-attempt delay
    pub async fn wait(&self, attempt: u32) {
        let delay = self.delay_for_attempt(attempt);
        debug!(
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            "Waiting before next attempt"
        );
        tokio::time::sleep(delay).await;
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

/// Builder for retry policy
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    config: RetryConfig,
}

impl RetryPolicyBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set max attempts
    #[must_use]
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    /// Set the inter-attempt delay
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = timeout;
        self
    }

    /// Build the policy
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicyBuilder::new()
            .delay(Duration::from_millis(500))
            .build();

        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(500));
    }

    #[test]
    fn test_has_next() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(policy.has_next(1));
        assert!(policy.has_next(2));
        assert!(!policy.has_next(3));
    }

    #[test]
    fn test_zero_budget_raised_to_one() {
        let policy = RetryPolicy::with_max_attempts(0);
        assert_eq!(policy.max_attempts(), 1);
        assert!(!policy.has_next(1));
    }

    #[test]
    fn test_builder() {
        let policy = RetryPolicyBuilder::new()
            .max_attempts(5)
            .delay(Duration::from_millis(200))
            .attempt_timeout(Duration::from_secs(30))
            .build();

        assert_eq!(policy.config().max_attempts, 5);
        assert_eq!(policy.config().delay, Duration::from_millis(200));
        assert_eq!(policy.attempt_timeout(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_sleeps_for_delay() {
        let policy = RetryPolicy::with_defaults();
        let start = Instant::now();
        policy.wait(1).await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
