//! Application state - shared across all handlers.

use std::sync::Arc;

use planpilot_core::clock::{Clock, SystemClock};
use planpilot_core::domain::UserEntitlementView;
use planpilot_core::ports::{
    RateLimitPolicy, RateLimiter, SubscriptionRepository, TokenClaims, TokenService,
};
use planpilot_core::{EntitlementResolver, PlanCatalog, RepoError};
use planpilot_infra::database::DatabaseConfig;
use planpilot_infra::{
    InMemorySubscriptionStore, JwtTokenService, SlidingWindowRateLimiter, SweeperHandle,
    spawn_sweeper,
};

use crate::config::{AppConfig, ConfigError, RateLimitBackend};

/// Per-action limits handlers apply.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicies {
    pub payment_orders: RateLimitPolicy,
    pub api: RateLimitPolicy,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub limiter: Arc<dyn RateLimiter>,
    pub policies: RateLimitPolicies,
    pub resolver: EntitlementResolver,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub clock: Arc<dyn Clock>,
    pub webhook_secret: Option<Arc<str>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Returns the sweeper handle when the in-memory limiter is in use; the
    /// caller owns it and must shut it down on exit.
    pub async fn new(config: &AppConfig) -> Result<(Self, Option<SweeperHandle>), ConfigError> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let catalog = match &config.catalog_path {
            Some(path) => {
                let catalog = PlanCatalog::from_file(path)?;
                tracing::info!(path = %path, plans = catalog.plans().len(), "Plan catalog loaded");
                catalog
            }
            None => {
                tracing::info!("Using built-in plan catalog");
                PlanCatalog::reference()
            }
        };

        let (limiter, sweeper) = build_limiter(config, clock.clone()).await;
        let subscriptions = build_subscriptions(config).await;

        tracing::info!("Application state initialized");

        Ok((
            Self {
                limiter,
                policies: RateLimitPolicies {
                    payment_orders: config.rate_limit.payment_orders,
                    api: config.rate_limit.api,
                },
                resolver: EntitlementResolver::new(Arc::new(catalog)),
                subscriptions,
                tokens: Arc::new(JwtTokenService::from_env()),
                clock,
                webhook_secret: config.webhook_secret.as_deref().map(Arc::from),
            },
            sweeper,
        ))
    }

    /// Plan and status for the caller: stored subscription first, then the
    /// session claims, then the free plan.
    pub async fn entitlement_view(
        &self,
        claims: &TokenClaims,
    ) -> Result<UserEntitlementView, RepoError> {
        if let Some(record) = self.subscriptions.find_by_user(&claims.user_id).await? {
            return Ok(record.view());
        }
        Ok(claims
            .entitlement_view()
            .unwrap_or_else(UserEntitlementView::free))
    }
}

async fn build_limiter(
    config: &AppConfig,
    clock: Arc<dyn Clock>,
) -> (Arc<dyn RateLimiter>, Option<SweeperHandle>) {
    if config.rate_limit.backend == RateLimitBackend::Redis {
        if let Some(limiter) = connect_redis_limiter(clock.clone()).await {
            return (limiter, None);
        }
    }

    let limiter = Arc::new(SlidingWindowRateLimiter::new(clock));
    let sweeper = spawn_sweeper(limiter.clone(), config.rate_limit.sweep.clone());
    (limiter, Some(sweeper))
}

#[cfg(feature = "redis")]
async fn connect_redis_limiter(clock: Arc<dyn Clock>) -> Option<Arc<dyn RateLimiter>> {
    use planpilot_infra::{RedisRateLimitConfig, RedisRateLimiter};

    match RedisRateLimiter::with_clock(RedisRateLimitConfig::from_env(), clock).await {
        Ok(limiter) => Some(Arc::new(limiter)),
        Err(e) => {
            tracing::error!(
                "Failed to connect to Redis rate limiter: {}. Using in-memory fallback.",
                e
            );
            None
        }
    }
}

#[cfg(not(feature = "redis"))]
async fn connect_redis_limiter(_clock: Arc<dyn Clock>) -> Option<Arc<dyn RateLimiter>> {
    tracing::warn!("RATE_LIMIT_BACKEND=redis but the redis feature is disabled");
    None
}

async fn build_subscriptions(config: &AppConfig) -> Arc<dyn SubscriptionRepository> {
    match &config.database {
        Some(db_config) => {
            if let Some(repo) = connect_subscription_db(db_config).await {
                return repo;
            }
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
    }

    Arc::new(InMemorySubscriptionStore::new())
}

#[cfg(feature = "postgres")]
async fn connect_subscription_db(
    db_config: &DatabaseConfig,
) -> Option<Arc<dyn SubscriptionRepository>> {
    use planpilot_infra::PostgresSubscriptionRepository;

    match planpilot_infra::database::connect(db_config).await {
        Ok(conn) => Some(Arc::new(PostgresSubscriptionRepository::new(conn))),
        Err(e) => {
            tracing::error!(
                "Failed to connect to database: {}. Using in-memory fallback.",
                e
            );
            None
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn connect_subscription_db(
    _db_config: &DatabaseConfig,
) -> Option<Arc<dyn SubscriptionRepository>> {
    tracing::info!("Running without postgres feature - using in-memory subscription store");
    None
}
