//! Rate limiting implementations.

mod memory;
mod sweeper;

pub use memory::SlidingWindowRateLimiter;
pub use sweeper::{SweepConfig, SweeperHandle, spawn_sweeper};

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::{RedisRateLimitConfig, RedisRateLimiter};
