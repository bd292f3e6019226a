//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod rate_limit;
mod subscription;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use rate_limit::{RateLimitError, RateLimitPolicy, RateLimitResult, RateLimiter, validate};
pub use subscription::SubscriptionRepository;
