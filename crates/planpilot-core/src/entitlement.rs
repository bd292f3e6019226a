//! Entitlement resolution.
//!
//! Maps `(plan, status, feature)` to an [`AccessDecision`]. Pure: the caller
//! supplies the plan and status it got from the subscription store or the
//! session, and the same inputs always produce the same decision.

use std::sync::Arc;

use crate::catalog::PlanCatalog;
use crate::domain::{AccessDecision, FeatureId, SubscriptionStatus, UserEntitlementView};

#[derive(Debug, Clone)]
pub struct EntitlementResolver {
    catalog: Arc<PlanCatalog>,
}

impl EntitlementResolver {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Decide whether a user on `plan_id` with `status` may use `feature`.
    ///
    /// Unknown feature identifiers are denied, never allowed.
    pub fn resolve(
        &self,
        plan_id: &str,
        status: SubscriptionStatus,
        feature: &str,
    ) -> AccessDecision {
        match feature.parse::<FeatureId>() {
            Ok(id) => self.resolve_feature(plan_id, status, id),
            Err(_) => AccessDecision::unknown_feature(feature),
        }
    }

    pub fn resolve_feature(
        &self,
        plan_id: &str,
        status: SubscriptionStatus,
        feature: FeatureId,
    ) -> AccessDecision {
        if !self.catalog.is_gated(feature) {
            return AccessDecision::ok(feature.as_str());
        }

        if status.is_active() && self.catalog.is_feature_included(plan_id, feature) {
            AccessDecision::ok(feature.as_str())
        } else {
            AccessDecision::requires_pro(feature.as_str())
        }
    }

    /// One decision per feature, in `FeatureId::ALL` order.
    pub fn resolve_all(&self, plan_id: &str, status: SubscriptionStatus) -> Vec<AccessDecision> {
        FeatureId::ALL
            .into_iter()
            .map(|feature| self.resolve_feature(plan_id, status, feature))
            .collect()
    }

    pub fn resolve_view(&self, view: &UserEntitlementView, feature: &str) -> AccessDecision {
        self.resolve(view.plan_id.as_str(), view.status, feature)
    }
}

impl Default for EntitlementResolver {
    fn default() -> Self {
        Self::new(Arc::new(PlanCatalog::reference()))
    }
}
