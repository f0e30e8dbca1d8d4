//! Retry policy for Admin API requests.

use std::time::Duration;

use crate::error::ApiError;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Do not retry.
    DoNotRetry,
}

/// Retry policy configuration.
///
/// The delay before attempt `n + 1` is `multiplier * 2^(n - 1)`, clamped to
/// `[min_delay, max_delay]`. A server-supplied Retry-After is honored within
/// the same bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: usize,
    /// Base unit of the exponential backoff.
    pub multiplier: Duration,
    /// Floor applied to every delay.
    pub min_delay: Duration,
    /// Ceiling applied to every delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: Duration::from_secs(1),
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = 2_u32.saturating_pow(u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX));
        self.clamp(self.multiplier.saturating_mul(exp))
    }

    fn clamp(&self, delay: Duration) -> Duration {
        delay.max(self.min_delay).min(self.max_delay)
    }

    /// Decide whether to retry based on the error and attempt count.
    pub fn decide(&self, error: &ApiError, attempt: usize) -> RetryDecision {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return RetryDecision::DoNotRetry;
        }

        let delay = match error {
            ApiError::RateLimited {
                retry_after: Some(after),
                ..
            } => self.clamp((*after).max(self.backoff(attempt))),
            _ => self.backoff(attempt),
        };
        RetryDecision::RetryAfter(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate_limited() -> ApiError {
        ApiError::RateLimited {
            message: "429".into(),
            retry_after: None,
        }
    }

    #[test]
    fn test_default_backoff_is_clamped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_secs(4));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(8));
        assert_eq!(policy.backoff(5), Duration::from_secs(10));
        assert_eq!(policy.backoff(60), Duration::from_secs(10));
    }

    #[test]
    fn test_stops_after_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(matches!(
            policy.decide(&rate_limited(), 1),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            policy.decide(&rate_limited(), 2),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(policy.decide(&rate_limited(), 3), RetryDecision::DoNotRetry);
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let err = ApiError::protocol("Field 'nope' doesn't exist on type 'QueryRoot'");
        assert_eq!(policy.decide(&err, 1), RetryDecision::DoNotRetry);
    }

    #[test]
    fn test_retry_after_is_bounded() {
        let policy = RetryPolicy::default();
        let err = ApiError::RateLimited {
            message: "429".into(),
            retry_after: Some(Duration::from_secs(60)),
        };
        assert_eq!(
            policy.decide(&err, 1),
            RetryDecision::RetryAfter(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_never_policy() {
        assert_eq!(
            RetryPolicy::never().decide(&rate_limited(), 1),
            RetryDecision::DoNotRetry
        );
    }
}
