//! Entitlement queries and feature gates.

use actix_web::{HttpResponse, web};
use planpilot_core::domain::AccessDecision;
use planpilot_shared::ApiResponse;
use planpilot_shared::dto::EntitlementsResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Every feature for the caller.
///
/// GET /api/entitlements
pub async fn list_entitlements(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let view = state.entitlement_view(&identity.claims).await?;
    let features = state
        .resolver
        .resolve_all(view.plan_id.as_str(), view.status);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(EntitlementsResponse::<AccessDecision> {
        plan_id: view.plan_id.to_string(),
        status: view.status.to_string(),
        features,
    })))
}

/// One feature for the caller. Denials are reported, not raised.
///
/// GET /api/entitlements/{feature}
pub async fn get_entitlement(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.entitlement_view(&identity.claims).await?;
    let decision = state.resolver.resolve_view(&view, &path);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(decision)))
}

/// Gate check before a feature is used.
///
/// POST /api/features/{feature}/authorize
pub async fn authorize_feature(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let view = state.entitlement_view(&identity.claims).await?;
    let decision = AppError::check_access(state.resolver.resolve_view(&view, &path))?;

    tracing::debug!(
        user_id = %identity.user_id,
        feature = %decision.feature,
        "Feature authorized"
    );

    Ok(HttpResponse::NoContent().finish())
}
