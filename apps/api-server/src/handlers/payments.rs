//! Payment order endpoint.

use actix_web::{HttpResponse, web};
use planpilot_core::domain::BillingCycle;
use planpilot_shared::ApiResponse;
use planpilot_shared::dto::{CreateOrderRequest, OrderQuoteResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Price a new order for a paid plan.
///
/// Limited per user before the body is parsed, so malformed requests
/// still count against the caller.
///
/// POST /api/payments/orders
pub async fn create_order(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let key = format!("payment:{}", identity.user_id);
    let result = state
        .limiter
        .check_policy(&key, &state.policies.payment_orders)
        .await?;

    if !result.allowed {
        tracing::warn!(user_id = %identity.user_id, "Payment order rate limit exceeded");
        return Err(AppError::rate_limited(&result, state.clock.now_millis()));
    }

    let body: CreateOrderRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid order request: {}", e)))?;

    let cycle = BillingCycle::parse(&body.billing_cycle).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Unknown billing cycle '{}', expected 'monthly' or 'yearly'",
            body.billing_cycle
        ))
    })?;

    let quote = state
        .resolver
        .catalog()
        .quote(&identity.user_id, &body.plan_id, cycle)?;

    tracing::info!(
        user_id = %identity.user_id,
        order_id = %quote.id,
        plan_id = %quote.plan_id,
        amount_cents = quote.amount_cents,
        "Order quoted"
    );

    let response = OrderQuoteResponse {
        order_id: quote.id.to_string(),
        plan_id: quote.plan_id.to_string(),
        billing_cycle: quote.billing_cycle.as_str().to_string(),
        amount_cents: quote.amount_cents,
        currency: quote.currency,
        created_at: quote.created_at.to_rfc3339(),
    };

    Ok(HttpResponse::Created().json(ApiResponse::ok(response)))
}
