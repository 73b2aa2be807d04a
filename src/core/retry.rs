//! Bounded retry policy for generation calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry policy for a failed generation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including first try)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_delay")]
    pub delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}
fn default_delay() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_delay(),
        }
    }
}

impl RetryPolicy {
    /// Policy with `retries` extra attempts and a fixed delay between them
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            max_attempts: retries + 1,
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Delay after a failed attempt; the same for every attempt
    pub fn delay_for_attempt(&self, _attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Check if we should retry based on attempt count
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_one_retry_with_fixed_delay() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);

        assert_eq!(policy.max_attempts, 4);
        assert!(policy.should_retry(3));
        assert!(!policy.should_retry(4));
        assert_eq!(policy.delay_for_attempt(3), Duration::ZERO);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let policy: RetryPolicy = serde_yaml::from_str("max_attempts: 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_ms, 2000);
    }

    #[test]
    fn test_unknown_backoff_keys_do_not_change_delay() {
        let policy: RetryPolicy =
            serde_yaml::from_str("delay_ms: 500\nbackoff_multiplier: 3.0").unwrap();
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(500));
    }
}
