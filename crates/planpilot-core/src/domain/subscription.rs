use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::plan::PlanId;

/// Billing state of a subscription as reported by the payment provider.
///
/// Lifecycle: `none -> active -> {cancelled, suspended, past_due} -> active | none`.
/// Only `Active` unlocks gated features; grace periods are the billing
/// provider's concern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    None,
    Active,
    #[serde(alias = "canceled")]
    Cancelled,
    Suspended,
    PastDue,
    /// A status string this service does not recognise.
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Suspended => "suspended",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = std::convert::Infallible;

    /// Never fails: unrecognised values map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "none" => SubscriptionStatus::None,
            "active" => SubscriptionStatus::Active,
            "cancelled" | "canceled" => SubscriptionStatus::Cancelled,
            "suspended" => SubscriptionStatus::Suspended,
            "past_due" => SubscriptionStatus::PastDue,
            _ => SubscriptionStatus::Unknown,
        })
    }
}

/// Stored subscription row for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    pub fn new(user_id: impl Into<String>, plan_id: PlanId, status: SubscriptionStatus) -> Self {
        Self {
            user_id: user_id.into(),
            plan_id,
            status,
            provider_subscription_id: None,
            current_period_end: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_provider_id(mut self, id: impl Into<String>) -> Self {
        self.provider_subscription_id = Some(id.into());
        self
    }

    pub fn view(&self) -> UserEntitlementView {
        UserEntitlementView {
            plan_id: self.plan_id.clone(),
            status: self.status,
        }
    }
}

/// The per-request `{ plan, status }` pair the resolver consumes.
///
/// Built by the caller from the subscription table or session claims and
/// dropped once the request completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntitlementView {
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
}

impl UserEntitlementView {
    pub fn new(plan_id: PlanId, status: SubscriptionStatus) -> Self {
        Self { plan_id, status }
    }

    /// View for a user with no subscription at all.
    pub fn free() -> Self {
        Self::new(PlanId::free(), SubscriptionStatus::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_active_is_active() {
        assert!(SubscriptionStatus::Active.is_active());
        for status in [
            SubscriptionStatus::None,
            SubscriptionStatus::Cancelled,
            SubscriptionStatus::Suspended,
            SubscriptionStatus::PastDue,
            SubscriptionStatus::Unknown,
        ] {
            assert!(!status.is_active(), "{status} must not be active");
        }
    }

    #[test]
    fn test_unrecognised_status_deserializes_to_unknown() {
        let status: SubscriptionStatus = serde_json::from_str("\"trialing\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Unknown);
        assert_eq!("trialing".parse(), Ok(SubscriptionStatus::Unknown));
    }

    #[test]
    fn test_american_spelling_is_cancelled() {
        assert_eq!("canceled".parse(), Ok(SubscriptionStatus::Cancelled));

        let status: SubscriptionStatus = serde_json::from_str("\"canceled\"").unwrap();
        assert_eq!(status, SubscriptionStatus::Cancelled);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"cancelled\"");
    }
}
