//! Redis rate limiter using a sorted-set sliding window log.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, Script};

use planpilot_core::clock::{Clock, SystemClock};
use planpilot_core::ports::{self, RateLimitError, RateLimitResult, RateLimiter};

/// Prunes, counts and conditionally records one hit atomically.
///
/// Returns `{allowed, count_after, oldest_score}`.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local max_requests = tonumber(ARGV[3])
local member = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local allowed = 0

if count < max_requests then
    redis.call('ZADD', key, now, member)
    count = count + 1
    allowed = 1
end

redis.call('PEXPIRE', key, window)
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local oldest_score = now
if oldest[2] then
    oldest_score = tonumber(oldest[2])
end

return {allowed, count, oldest_score}
"#;

/// Redis rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RedisRateLimitConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Key prefix for rate limit keys
    pub key_prefix: String,
}

impl Default for RedisRateLimitConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "ratelimit".to_string(),
        }
    }
}

impl RedisRateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("RATE_LIMIT_KEY_PREFIX")
                .unwrap_or_else(|_| "ratelimit".to_string()),
        }
    }
}

/// Redis-backed sliding-window limiter. Limits hold across every process
/// sharing the Redis instance.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    config: RedisRateLimitConfig,
    script: Script,
    clock: Arc<dyn Clock>,
}

impl RedisRateLimiter {
    pub async fn new(config: RedisRateLimitConfig) -> Result<Self, RateLimitError> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(
        config: RedisRateLimitConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, RateLimitError> {
        let client =
            Client::open(config.url.as_str()).map_err(|e| RateLimitError::Backend(e.to_string()))?;

        // Use timeout to prevent hanging if Redis is unreachable
        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| RateLimitError::Backend("Connection timed out".to_string()))?
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        tracing::info!(url = %config.url, "Connected to Redis rate limiter");

        Ok(Self {
            conn,
            config,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
            clock,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, RateLimitError> {
        Self::new(RedisRateLimitConfig::from_env()).await
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}:{}", self.config.key_prefix, key)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(
        &self,
        key: &str,
        max_requests: u32,
        window_ms: u64,
    ) -> Result<RateLimitResult, RateLimitError> {
        ports::validate(max_requests, window_ms)?;

        let redis_key = self.make_key(key);
        let now = self.clock.now_millis();
        // Unique member so equal timestamps are counted separately.
        let member = format!("{}-{}", now, uuid::Uuid::new_v4());
        let mut conn = self.conn.clone();

        let result: Vec<i64> = self
            .script
            .key(&redis_key)
            .arg(now)
            .arg(window_ms)
            .arg(max_requests)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let allowed = result.first().copied().unwrap_or(0) == 1;
        let count = result.get(1).copied().unwrap_or(0).max(0) as u32;
        let oldest = result.get(2).copied().unwrap_or(now as i64).max(0) as u64;

        if !allowed {
            tracing::warn!(key = %key, limit = max_requests, "Rate limit exceeded");
        }

        Ok(RateLimitResult {
            allowed,
            remaining: if allowed {
                max_requests.saturating_sub(count)
            } else {
                0
            },
            limit: max_requests,
            reset_at_ms: oldest.saturating_add(window_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planpilot_core::clock::ManualClock;

    async fn get_test_ratelimiter(clock: Arc<ManualClock>) -> Option<RedisRateLimiter> {
        let config = RedisRateLimitConfig {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            key_prefix: format!("test_ratelimit:{}", uuid::Uuid::new_v4()),
        };

        RedisRateLimiter::with_clock(config, clock).await.ok()
    }

    #[tokio::test]
    async fn test_redis_ratelimiter() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let limiter = match get_test_ratelimiter(clock.clone()).await {
            Some(l) => l,
            None => return,
        };

        let key = "payment:u1";

        let res = limiter.check(key, 2, 60_000).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 1);

        clock.advance(1);
        let res = limiter.check(key, 2, 60_000).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 0);

        clock.advance(1);
        let res = limiter.check(key, 2, 60_000).await.unwrap();
        assert!(!res.allowed);
        assert_eq!(res.reset_at_ms, 1_060_000);

        clock.set(res.reset_at_ms);
        let res = limiter.check(key, 2, 60_000).await.unwrap();
        assert!(res.allowed);
    }

    #[tokio::test]
    async fn test_redis_rejects_zero_window() {
        let limiter = match get_test_ratelimiter(Arc::new(ManualClock::new(0))).await {
            Some(l) => l,
            None => return,
        };

        assert!(matches!(
            limiter.check("k", 1, 0).await,
            Err(RateLimitError::InvalidConfig(_))
        ));
    }
}
