//! Billing provider webhook.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use planpilot_core::domain::{PlanId, SubscriptionRecord, SubscriptionStatus};
use planpilot_shared::dto::{BillingWebhookEvent, WebhookAck};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

/// Subscription change carried by a provider event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Status(SubscriptionStatus),
    /// Subscription ended; the user drops back to the free plan.
    Expired,
}

fn transition_for(event_type: &str) -> Option<Transition> {
    match event_type {
        "BILLING.SUBSCRIPTION.ACTIVATED" => Some(Transition::Status(SubscriptionStatus::Active)),
        "BILLING.SUBSCRIPTION.CANCELLED" => {
            Some(Transition::Status(SubscriptionStatus::Cancelled))
        }
        "BILLING.SUBSCRIPTION.SUSPENDED" => {
            Some(Transition::Status(SubscriptionStatus::Suspended))
        }
        "BILLING.SUBSCRIPTION.PAYMENT.FAILED" => {
            Some(Transition::Status(SubscriptionStatus::PastDue))
        }
        "BILLING.SUBSCRIPTION.EXPIRED" => Some(Transition::Expired),
        _ => None,
    }
}

fn verify_secret(state: &AppState, req: &HttpRequest) -> AppResult<()> {
    let expected = state.webhook_secret.as_deref().ok_or_else(|| {
        tracing::warn!("Billing webhook received but no webhook secret is configured");
        AppError::Unauthorized
    })?;

    let provided = req
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected.as_bytes()) => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

/// Byte comparison whose running time does not depend on where inputs differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Apply a subscription lifecycle event.
///
/// POST /api/billing/webhook
pub async fn billing_webhook(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<BillingWebhookEvent>,
) -> AppResult<HttpResponse> {
    verify_secret(&state, &req)?;

    let event = body.into_inner();
    let resource = event.resource;

    let Some(transition) = transition_for(&event.event_type) else {
        tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring billing event");
        return Ok(HttpResponse::Ok().json(WebhookAck {
            received: true,
            status: None,
        }));
    };

    if resource.custom_id.is_empty() {
        return Err(AppError::BadRequest(
            "Webhook resource is missing custom_id".to_string(),
        ));
    }

    let existing = state.subscriptions.find_by_user(&resource.custom_id).await?;

    let (plan_id, status) = match transition {
        Transition::Expired => (PlanId::free(), SubscriptionStatus::None),
        Transition::Status(status) => {
            let plan_id = resource
                .plan_id
                .as_deref()
                .map(PlanId::from)
                .or_else(|| existing.as_ref().map(|record| record.plan_id.clone()))
                .unwrap_or_else(PlanId::pro);

            if state.resolver.catalog().get_plan(plan_id.as_str()).is_none() {
                return Err(AppError::BadRequest(format!("Unknown plan '{}'", plan_id)));
            }
            (plan_id, status)
        }
    };

    let mut record =
        SubscriptionRecord::new(resource.custom_id, plan_id, status).with_provider_id(resource.id);
    record.current_period_end = resource
        .next_billing_time
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|time| time.with_timezone(&Utc))
        .or_else(|| existing.and_then(|record| record.current_period_end));

    let record = state.subscriptions.upsert(record).await?;

    tracing::info!(
        event_id = %event.id,
        user_id = %record.user_id,
        plan_id = %record.plan_id,
        status = %record.status,
        "Subscription updated"
    );

    Ok(HttpResponse::Ok().json(WebhookAck {
        received: true,
        status: Some(record.status.to_string()),
    }))
}
