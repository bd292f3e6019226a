//! Domain entities - plans, features, subscriptions and access decisions.

mod billing;
mod decision;
mod feature;
mod plan;
mod subscription;

pub use billing::OrderQuote;
pub use decision::{AccessDecision, AccessReason};
pub use feature::{FeatureId, UnknownFeature};
pub use plan::{BillingCycle, Plan, PlanId, PlanPrice};
pub use subscription::{SubscriptionRecord, SubscriptionStatus, UserEntitlementView};
