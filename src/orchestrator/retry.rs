use crate::model::ProcessingResult;
use std::time::Duration;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Whether `result`, produced by attempt number `attempt` (1-based),
    /// earns another try
    pub fn should_retry(&self, attempt: u32, result: &ProcessingResult) -> bool {
        result.is_retryable() && attempt < self.max_attempts
    }

    /// Delay before attempt `attempt + 1`: `base × 2^(attempt-1)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FetchMethod, ScrapingError};

    fn failed(error: ScrapingError) -> ProcessingResult {
        ProcessingResult::failure("https://example.com/", error, FetchMethod::Static, Vec::new(), 1)
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_retry_bounded_by_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let result = failed(ScrapingError::from_status("https://example.com/", 503));
        assert!(policy.should_retry(1, &result));
        assert!(policy.should_retry(2, &result));
        assert!(!policy.should_retry(3, &result));
    }

    #[test]
    fn test_permanent_failures_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let not_found = failed(ScrapingError::from_status("https://example.com/", 404));
        let blocked = failed(ScrapingError::robots_disallowed("https://example.com/", "no"));
        assert!(!policy.should_retry(1, &not_found));
        assert!(!policy.should_retry(1, &blocked));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
