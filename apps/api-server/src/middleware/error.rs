//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use planpilot_core::domain::{AccessDecision, AccessReason};
use planpilot_core::error::{DomainError, RepoError};
use planpilot_core::ports::{RateLimitError, RateLimitResult};
use planpilot_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    /// A gated feature was denied.
    FeatureDenied(AccessDecision),
    RateLimited {
        limit: u32,
        retry_after_secs: u64,
    },
    Internal(String),
}

impl AppError {
    /// Rejection for a rate limit result, rounding the wait up to whole seconds.
    pub fn rate_limited(result: &RateLimitResult, now_ms: u64) -> Self {
        let wait_ms = result.retry_after(now_ms).as_millis() as u64;
        AppError::RateLimited {
            limit: result.limit,
            retry_after_secs: wait_ms.div_ceil(1000).max(1),
        }
    }

    /// `Ok` if the decision allows the feature.
    pub fn check_access(decision: AccessDecision) -> Result<AccessDecision, AppError> {
        if decision.allowed {
            Ok(decision)
        } else {
            Err(AppError::FeatureDenied(decision))
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::FeatureDenied(decision) => {
                write!(f, "Access to {} denied: {:?}", decision.feature, decision.reason)
            }
            AppError::RateLimited {
                retry_after_secs, ..
            } => write!(f, "Rate limited for {}s", retry_after_secs),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::FeatureDenied(decision) => match decision.reason {
                AccessReason::UnknownFeature => StatusCode::NOT_FOUND,
                _ => StatusCode::PAYMENT_REQUIRED,
            },
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());

        let error = match self {
            AppError::NotFound(detail) => ErrorResponse::not_found(detail),
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail),
            AppError::Unauthorized => ErrorResponse::unauthorized(),
            AppError::FeatureDenied(decision) => match decision.reason {
                AccessReason::UnknownFeature => {
                    ErrorResponse::not_found(format!("Unknown feature '{}'", decision.feature))
                        .with_code("unknown_feature")
                }
                _ => ErrorResponse::payment_required(format!(
                    "'{}' requires an active Pro subscription",
                    decision.feature
                ))
                .with_code("requires_pro"),
            },
            AppError::RateLimited {
                limit,
                retry_after_secs,
            } => {
                builder
                    .insert_header(("Retry-After", retry_after_secs.to_string()))
                    .insert_header(("X-RateLimit-Limit", limit.to_string()))
                    .insert_header(("X-RateLimit-Remaining", "0"));
                ErrorResponse::too_many_requests(*retry_after_secs)
            }
            AppError::Internal(detail) => {
                // Log internal errors
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error()
            }
        };

        builder.json(error)
    }
}

// Conversion from domain errors
impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} '{}' not found", entity_type, id))
            }
            DomainError::Validation(msg) => AppError::BadRequest(msg),
            DomainError::Unauthorized => AppError::Unauthorized,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound("Resource not found".to_string()),
            RepoError::Constraint(msg) => AppError::BadRequest(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        AppError::Internal(format!("Rate limiter: {}", err))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
