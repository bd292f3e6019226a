//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// Request to price an order for a paid plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub plan_id: String,
    /// `monthly` or `yearly`.
    pub billing_cycle: String,
}

/// Quote returned for a new payment order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderQuoteResponse {
    pub order_id: String,
    pub plan_id: String,
    pub billing_cycle: String,
    pub amount_cents: u64,
    pub currency: String,
    pub created_at: String,
}

/// Entitlements of the calling user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitlementsResponse<D> {
    pub plan_id: String,
    pub status: String,
    pub features: Vec<D>,
}

/// Billing provider webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingWebhookEvent {
    pub id: String,
    pub event_type: String,
    pub resource: BillingWebhookResource,
}

/// Subscription resource embedded in a webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingWebhookResource {
    /// Provider subscription id.
    pub id: String,
    /// Our user id, passed to the provider when the subscription was created.
    pub custom_id: String,
    #[serde(default)]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub next_billing_time: Option<String>,
}

/// Acknowledgement for a processed webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
    pub status: Option<String>,
}
