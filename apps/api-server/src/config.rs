//! Application configuration loaded from environment variables.

use std::env;

use planpilot_core::CatalogError;
use planpilot_core::ports::{RateLimitError, RateLimitPolicy};
use planpilot_infra::SweepConfig;
use planpilot_infra::database::DatabaseConfig;

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name}: {source}")]
    RateLimit {
        name: &'static str,
        #[source]
        source: RateLimitError,
    },

    #[error("Plan catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Where rate limit logs live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitBackend {
    Memory,
    Redis,
}

/// Limits for each guarded action.
#[derive(Debug, Clone)]
pub struct RateLimitSettings {
    pub backend: RateLimitBackend,
    /// Applied per user to payment order creation.
    pub payment_orders: RateLimitPolicy,
    /// Applied per client IP to every API route.
    pub api: RateLimitPolicy,
    pub sweep: SweepConfig,
}

impl RateLimitSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = match env::var("RATE_LIMIT_BACKEND").as_deref() {
            Err(_) | Ok("memory") => RateLimitBackend::Memory,
            Ok("redis") => RateLimitBackend::Redis,
            Ok(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "RATE_LIMIT_BACKEND",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            backend,
            payment_orders: policy_from_env(
                "PAYMENT_RATE_LIMIT",
                "PAYMENT_RATE_LIMIT_MAX",
                "PAYMENT_RATE_LIMIT_WINDOW_MS",
                3,
                60_000,
            )?,
            api: policy_from_env(
                "API_RATE_LIMIT",
                "API_RATE_LIMIT_MAX",
                "API_RATE_LIMIT_WINDOW_MS",
                100,
                60_000,
            )?,
            sweep: SweepConfig::from_env(),
        })
    }
}

fn policy_from_env(
    name: &'static str,
    max_var: &str,
    window_var: &str,
    default_max: u32,
    default_window_ms: u64,
) -> Result<RateLimitPolicy, ConfigError> {
    let max_requests = env::var(max_var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_max);
    let window_ms = env::var(window_var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_window_ms);

    RateLimitPolicy::new(max_requests, window_ms)
        .map_err(|source| ConfigError::RateLimit { name, source })
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub rate_limit: RateLimitSettings,
    /// JSON plan catalog; the built-in catalog is used when unset.
    pub catalog_path: Option<String>,
    /// Shared secret expected in `X-Webhook-Secret`.
    pub webhook_secret: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            rate_limit: RateLimitSettings::from_env()?,
            catalog_path: env::var("PLAN_CATALOG_PATH").ok(),
            webhook_secret: env::var("BILLING_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_defaults_when_unset() {
        let policy = policy_from_env(
            "TEST_LIMIT",
            "PLANPILOT_TEST_UNSET_MAX",
            "PLANPILOT_TEST_UNSET_WINDOW_MS",
            3,
            60_000,
        )
        .unwrap();

        assert_eq!(policy, RateLimitPolicy::new(3, 60_000).unwrap());
    }

    #[test]
    fn test_zero_policy_is_rejected() {
        let err = policy_from_env(
            "TEST_LIMIT",
            "PLANPILOT_TEST_UNSET_MAX",
            "PLANPILOT_TEST_UNSET_WINDOW_MS",
            0,
            60_000,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::RateLimit {
                name: "TEST_LIMIT",
                source: RateLimitError::InvalidConfig(_)
            }
        ));
    }
}
