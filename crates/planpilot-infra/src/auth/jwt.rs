//! JWT session token service.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use planpilot_core::domain::{PlanId, SubscriptionStatus};
use planpilot_core::ports::{AuthError, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            issuer: "planpilot".to_string(),
        }
    }
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        // Warn if using default secret in production
        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        Self {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(24),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "planpilot".to_string()),
        }
    }
}

/// Wire format of the session claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subscription_status: Option<SubscriptionStatus>,
    exp: i64,
    iat: i64,
    iss: String,
}

/// HS256 session token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(JwtConfig::from_env())
    }

    pub fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = if claims.exp > 0 {
            claims.exp
        } else {
            (now + TimeDelta::hours(self.config.expiration_hours)).timestamp()
        };

        let wire = Claims {
            sub: claims.user_id.clone(),
            email: claims.email.clone(),
            plan: claims.plan.as_ref().map(|p| p.to_string()),
            subscription_status: claims.subscription_status,
            exp,
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &wire, &self.encoding_key)
            .map_err(|e| AuthError::Encoding(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let claims = token_data.claims;
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("Empty subject".to_string()));
        }

        Ok(TokenClaims {
            user_id: claims.sub,
            email: claims.email,
            plan: claims.plan.map(PlanId::new),
            subscription_status: claims.subscription_status,
            exp: claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        }
    }

    fn claims(plan: Option<&str>, status: Option<SubscriptionStatus>) -> TokenClaims {
        TokenClaims {
            user_id: "user_2abc".to_string(),
            email: "founder@example.com".to_string(),
            plan: plan.map(PlanId::from),
            subscription_status: status,
            exp: 0,
        }
    }

    #[test]
    fn test_roundtrip_with_plan_claims() {
        let service = JwtTokenService::new(test_config());

        let token = service
            .generate_token(&claims(Some("pro"), Some(SubscriptionStatus::Active)))
            .unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert_eq!(decoded.user_id, "user_2abc");
        assert_eq!(decoded.plan, Some(PlanId::pro()));
        assert_eq!(decoded.subscription_status, Some(SubscriptionStatus::Active));
        let view = decoded.entitlement_view().unwrap();
        assert!(view.status.is_active());
    }

    #[test]
    fn test_token_without_plan_claims() {
        let service = JwtTokenService::new(test_config());

        let token = service.generate_token(&claims(None, None)).unwrap();
        let decoded = service.validate_token(&token).unwrap();

        assert!(decoded.plan.is_none());
        assert!(decoded.entitlement_view().is_none());
    }

    #[test]
    fn test_validate_invalid_token() {
        let service = JwtTokenService::new(test_config());

        let result = service.validate_token("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtTokenService::new(test_config());
        let mut expired = claims(None, None);
        expired.exp = Utc::now().timestamp() - 3600;

        let token = service.generate_token(&expired).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_validate_wrong_issuer_token() {
        let service1 = JwtTokenService::new(JwtConfig {
            issuer: "issuer1".to_string(),
            ..test_config()
        });
        let service2 = JwtTokenService::new(JwtConfig {
            issuer: "issuer2".to_string(),
            ..test_config()
        });

        let token = service1.generate_token(&claims(None, None)).unwrap();

        assert!(service2.validate_token(&token).is_err());
    }

    #[test]
    fn test_expiration_seconds() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: 24,
            ..test_config()
        });

        assert_eq!(service.expiration_seconds(), 86400);
    }
}
