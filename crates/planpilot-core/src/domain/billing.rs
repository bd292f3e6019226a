use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::{BillingCycle, Plan, PlanId};

/// Priced order for a plan, handed to the payment provider by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub id: Uuid,
    pub user_id: String,
    pub plan_id: PlanId,
    pub billing_cycle: BillingCycle,
    pub amount_cents: u64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl OrderQuote {
    pub fn new(user_id: impl Into<String>, plan: &Plan, cycle: BillingCycle) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            plan_id: plan.id.clone(),
            billing_cycle: cycle,
            amount_cents: plan.price.for_cycle(cycle),
            currency: plan.price.currency.clone(),
            created_at: Utc::now(),
        }
    }
}
