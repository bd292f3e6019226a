//! In-memory sliding-window rate limiter.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use planpilot_core::clock::{Clock, SystemClock};
use planpilot_core::ports::{self, RateLimitError, RateLimitResult, RateLimiter};

/// Admission timestamps for one key, oldest first.
#[derive(Debug, Default)]
struct RequestLog {
    hits: VecDeque<u64>,
    /// Newest admission ever recorded; survives pruning.
    last_hit_ms: u64,
    /// Window of the most recent check, used by the sweeper to prune.
    window_ms: u64,
}

impl RequestLog {
    /// Drop entries that are `window_ms` or more behind `now`.
    fn prune(&mut self, now: u64, window_ms: u64) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_sub(oldest) >= window_ms {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn push(&mut self, now: u64) {
        self.hits.push_back(now);
        self.last_hit_ms = now;
    }
}

/// Per-key sliding-window log held in process memory.
///
/// Counts are per-process: several instances behind a load balancer each
/// admit up to the limit. Use the Redis limiter for global limits.
pub struct SlidingWindowRateLimiter {
    logs: DashMap<String, RequestLog>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowRateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        tracing::info!("Sliding-window rate limiter created");
        Self {
            logs: DashMap::new(),
            clock,
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Remove keys whose log has been empty for at least `grace_ms`.
    ///
    /// Returns the number of keys removed.
    pub fn sweep(&self, grace_ms: u64) -> usize {
        let now = self.clock.now_millis();
        let before = self.logs.len();

        self.logs.retain(|_, log| {
            // A log becomes empty when its newest entry leaves the window.
            let emptied_at = log.last_hit_ms.saturating_add(log.window_ms);
            log.prune(now, log.window_ms);
            !(log.hits.is_empty() && now.saturating_sub(emptied_at) >= grace_ms)
        });

        let removed = before.saturating_sub(self.logs.len());
        tracing::debug!(removed, remaining = self.logs.len(), "Rate limit sweep finished");
        removed
    }
}

impl Default for SlidingWindowRateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowRateLimiter {
    async fn check(
        &self,
        key: &str,
        max_requests: u32,
        window_ms: u64,
    ) -> Result<RateLimitResult, RateLimitError> {
        ports::validate(max_requests, window_ms)?;

        // The entry guard is held until the end of this block, so no other
        // check for this key can interleave with prune-compare-append.
        let mut log = self.logs.entry(key.to_string()).or_default();
        let now = self.clock.now_millis().max(log.last_hit_ms);

        log.window_ms = window_ms;
        log.prune(now, window_ms);

        let count = log.hits.len();
        if count >= max_requests as usize {
            let oldest = log.hits.front().copied().unwrap_or(now);
            tracing::warn!(key = %key, limit = max_requests, "Rate limit exceeded");
            return Ok(RateLimitResult {
                allowed: false,
                remaining: 0,
                limit: max_requests,
                reset_at_ms: oldest.saturating_add(window_ms),
            });
        }

        log.push(now);
        let oldest = log.hits.front().copied().unwrap_or(now);

        Ok(RateLimitResult {
            allowed: true,
            remaining: max_requests - (count as u32 + 1),
            limit: max_requests,
            reset_at_ms: oldest.saturating_add(window_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planpilot_core::clock::ManualClock;

    fn limiter_at(start: u64) -> (Arc<ManualClock>, SlidingWindowRateLimiter) {
        let clock = Arc::new(ManualClock::new(start));
        let limiter = SlidingWindowRateLimiter::new(clock.clone());
        (clock, limiter)
    }

    #[tokio::test]
    async fn test_payment_scenario() {
        let (clock, limiter) = limiter_at(0);
        let key = "payment:u1";

        for (t, expected_remaining) in [(0, 2), (1, 1), (2, 0)] {
            clock.set(t);
            let res = limiter.check(key, 3, 60_000).await.unwrap();
            assert!(res.allowed, "call at t={t}");
            assert_eq!(res.remaining, expected_remaining);
        }

        clock.set(3);
        let res = limiter.check(key, 3, 60_000).await.unwrap();
        assert!(!res.allowed);
        assert_eq!(res.remaining, 0);
        assert_eq!(res.reset_at_ms, 60_000);

        clock.set(60_001);
        let res = limiter.check(key, 3, 60_000).await.unwrap();
        assert!(res.allowed);
    }

    #[tokio::test]
    async fn test_admitted_again_exactly_at_reset() {
        let (clock, limiter) = limiter_at(1_000);

        assert!(limiter.check("k", 1, 500).await.unwrap().allowed);

        clock.set(1_499);
        let res = limiter.check("k", 1, 500).await.unwrap();
        assert!(!res.allowed);
        assert_eq!(res.reset_at_ms, 1_500);

        clock.set(res.reset_at_ms);
        assert!(limiter.check("k", 1, 500).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_rejections_do_not_extend_window() {
        let (clock, limiter) = limiter_at(0);

        assert!(limiter.check("k", 1, 100).await.unwrap().allowed);
        for t in 1..100 {
            clock.set(t);
            assert!(!limiter.check("k", 1, 100).await.unwrap().allowed);
        }
        clock.set(100);
        assert!(limiter.check("k", 1, 100).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_keys_are_isolated() {
        let (_clock, limiter) = limiter_at(0);

        assert!(limiter.check("a", 1, 1_000).await.unwrap().allowed);
        assert!(!limiter.check("a", 1, 1_000).await.unwrap().allowed);

        let res = limiter.check("b", 1, 1_000).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 0);

        // Empty string is just another key.
        assert!(limiter.check("", 1, 1_000).await.unwrap().allowed);
        assert_eq!(limiter.len(), 3);
    }

    #[tokio::test]
    async fn test_at_most_n_in_any_trailing_window() {
        let (clock, limiter) = limiter_at(0);
        let (max, window) = (4u32, 50u64);
        let mut admitted = Vec::new();

        for t in (0..500).step_by(3) {
            clock.set(t);
            let res = limiter.check("k", max, window).await.unwrap();
            assert!(res.remaining <= max);
            if res.allowed {
                admitted.push(t);
            }
        }

        for &end in &admitted {
            let in_window = admitted
                .iter()
                .filter(|&&t| t <= end && end - t < window)
                .count();
            assert!(in_window <= max as usize, "window ending at {end}");
        }
    }

    #[tokio::test]
    async fn test_zero_limits_are_invalid() {
        let (_clock, limiter) = limiter_at(0);

        assert!(matches!(
            limiter.check("k", 0, 1_000).await,
            Err(RateLimitError::InvalidConfig(_))
        ));
        assert!(matches!(
            limiter.check("k", 1, 0).await,
            Err(RateLimitError::InvalidConfig(_))
        ));
        assert!(limiter.is_empty());
    }

    #[tokio::test]
    async fn test_clock_going_backwards_keeps_log_ordered() {
        let (clock, limiter) = limiter_at(1_000);

        assert!(limiter.check("k", 2, 100).await.unwrap().allowed);
        clock.set(900);
        let res = limiter.check("k", 2, 100).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.reset_at_ms, 1_100);
    }

    #[tokio::test]
    async fn test_sweep_respects_grace_period() {
        let (clock, limiter) = limiter_at(0);

        limiter.check("old", 5, 100).await.unwrap();
        clock.set(500);
        limiter.check("fresh", 5, 100).await.unwrap();

        // "old" emptied at t=100, "fresh" still holds an entry.
        clock.set(550);
        assert_eq!(limiter.sweep(1_000), 0);
        assert_eq!(limiter.sweep(400), 1);
        assert_eq!(limiter.len(), 1);

        // "fresh" emptied at t=600.
        clock.set(700);
        assert_eq!(limiter.sweep(200), 0);
        clock.set(800);
        assert_eq!(limiter.sweep(200), 1);
        assert!(limiter.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_never_exceed_limit() {
        let (_clock, limiter) = limiter_at(0);
        let limiter = Arc::new(limiter);

        let mut tasks = Vec::new();
        for _ in 0..64 {
            let limiter = limiter.clone();
            tasks.push(tokio::spawn(async move {
                limiter.check("shared", 10, 60_000).await.unwrap().allowed
            }));
        }

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 10);
    }
}
