//! Rate limiting port.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sliding-window rate limiter keyed by caller identity.
///
/// Implementations must make the prune-count-append sequence for a single
/// key atomic with respect to concurrent checks on that key.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Admit or reject one action for `key`.
    ///
    /// At most `max_requests` actions are admitted in any trailing window of
    /// `window_ms` milliseconds. Zero for either argument is an
    /// [`RateLimitError::InvalidConfig`].
    async fn check(
        &self,
        key: &str,
        max_requests: u32,
        window_ms: u64,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Check against a validated policy.
    async fn check_policy(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitResult, RateLimitError> {
        self.check(key, policy.max_requests, policy.window_ms).await
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Admissions left in the current window; always `0..=limit`.
    pub remaining: u32,
    pub limit: u32,
    /// Instant (epoch ms) at which the oldest retained entry leaves the window.
    pub reset_at_ms: u64,
}

impl RateLimitResult {
    /// Time until `reset_at_ms`, zero if already past.
    pub fn retry_after(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.reset_at_ms.saturating_sub(now_ms))
    }
}

/// Limit for one guarded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window_ms: u64) -> Result<Self, RateLimitError> {
        validate(max_requests, window_ms)?;
        Ok(Self {
            max_requests,
            window_ms,
        })
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Reject non-positive limits before touching any state.
pub fn validate(max_requests: u32, window_ms: u64) -> Result<(), RateLimitError> {
    if max_requests == 0 {
        return Err(RateLimitError::InvalidConfig(
            "max_requests must be positive".to_string(),
        ));
    }
    if window_ms == 0 {
        return Err(RateLimitError::InvalidConfig(
            "window_ms must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Invalid rate limit configuration: {0}")]
    InvalidConfig(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_rejects_zero() {
        assert!(matches!(
            RateLimitPolicy::new(0, 1000),
            Err(RateLimitError::InvalidConfig(_))
        ));
        assert!(matches!(
            RateLimitPolicy::new(3, 0),
            Err(RateLimitError::InvalidConfig(_))
        ));
        assert_eq!(RateLimitPolicy::new(3, 60_000).unwrap().window().as_secs(), 60);
    }

    #[test]
    fn test_retry_after_saturates() {
        let result = RateLimitResult {
            allowed: false,
            remaining: 0,
            limit: 3,
            reset_at_ms: 60_000,
        };
        assert_eq!(result.retry_after(59_000), Duration::from_secs(1));
        assert_eq!(result.retry_after(70_000), Duration::ZERO);
    }
}
