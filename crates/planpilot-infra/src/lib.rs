//! # PlanPilot Infrastructure
//!
//! Concrete implementations of the ports defined in `planpilot-core`.
//! This crate contains the rate limit stores, subscription persistence and
//! session token validation.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL subscription repository via SeaORM
//! - `auth` - JWT session tokens
//! - `redis` - Redis-backed sliding-window rate limiter

pub mod database;
pub mod rate_limit;
pub mod subscription;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use rate_limit::{SlidingWindowRateLimiter, SweepConfig, SweeperHandle, spawn_sweeper};
pub use subscription::InMemorySubscriptionStore;

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

#[cfg(feature = "postgres")]
pub use database::PostgresSubscriptionRepository;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use rate_limit::{RedisRateLimitConfig, RedisRateLimiter};
