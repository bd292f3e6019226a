//! Session token port.

use crate::domain::{PlanId, SubscriptionStatus, UserEntitlementView};

/// Claims carried by a session token issued by the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub user_id: String,
    pub email: String,
    /// Plan claim, when the identity provider mirrors billing state.
    pub plan: Option<PlanId>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub exp: i64,
}

impl TokenClaims {
    /// Entitlement view from claims alone, `None` if no plan was claimed.
    pub fn entitlement_view(&self) -> Option<UserEntitlementView> {
        self.plan.as_ref().map(|plan| {
            UserEntitlementView::new(plan.clone(), self.subscription_status.unwrap_or_default())
        })
    }
}

/// Token service trait for session JWTs.
pub trait TokenService: Send + Sync {
    /// Issue a token. Used by tooling and tests; production tokens come from
    /// the identity provider.
    fn generate_token(&self, claims: &TokenClaims) -> Result<String, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authorization header")]
    MissingAuth,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}
