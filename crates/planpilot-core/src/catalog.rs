//! Plan/Feature catalog.
//!
//! Static mapping from plan ids to prices and unlocked features. Loaded once
//! at startup, either the built-in reference catalog or a deployment JSON
//! file; nothing in the resolver hardcodes plan contents.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{BillingCycle, FeatureId, OrderQuote, Plan, PlanId, PlanPrice};
use crate::error::{CatalogError, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Build a catalog, rejecting duplicate ids and catalogs without `free`.
    pub fn new(plans: Vec<Plan>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for plan in &plans {
            if !seen.insert(plan.id.as_str()) {
                return Err(CatalogError::DuplicatePlan(plan.id.to_string()));
            }
        }
        if !seen.contains(PlanId::FREE) {
            return Err(CatalogError::MissingFreePlan);
        }
        Ok(Self { plans })
    }

    /// The two-plan catalog PlanPilot ships with.
    pub fn reference() -> Self {
        Self {
            plans: vec![
                Plan {
                    id: PlanId::free(),
                    name: "Free".to_string(),
                    price: PlanPrice::zero("USD"),
                    features: Vec::new(),
                },
                Plan {
                    id: PlanId::pro(),
                    name: "Pro".to_string(),
                    price: PlanPrice {
                        currency: "USD".to_string(),
                        monthly_cents: 1900,
                        yearly_cents: 19000,
                    },
                    features: FeatureId::ALL.to_vec(),
                },
            ],
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: PlanCatalog = serde_json::from_str(json)?;
        Self::new(raw.plans)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn get_plan(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id.as_str() == plan_id)
    }

    /// Unknown plans include nothing.
    pub fn is_feature_included(&self, plan_id: &str, feature: FeatureId) -> bool {
        self.get_plan(plan_id)
            .map(|plan| plan.includes(feature))
            .unwrap_or(false)
    }

    /// A feature is gated when some paid plan unlocks it and no free plan
    /// includes it.
    pub fn is_gated(&self, feature: FeatureId) -> bool {
        let unlocked_by_paid = self
            .plans
            .iter()
            .any(|plan| !plan.price.is_free() && plan.includes(feature));
        let free_tier = self
            .plans
            .iter()
            .any(|plan| plan.price.is_free() && plan.includes(feature));
        unlocked_by_paid && !free_tier
    }

    /// Price of `plan_id` for one billing cycle, in minor currency units.
    pub fn price_for(&self, plan_id: &str, cycle: BillingCycle) -> Option<u64> {
        self.get_plan(plan_id).map(|plan| plan.price.for_cycle(cycle))
    }

    /// Price an order for a paid plan.
    pub fn quote(
        &self,
        user_id: &str,
        plan_id: &str,
        cycle: BillingCycle,
    ) -> Result<OrderQuote, DomainError> {
        let plan = self.get_plan(plan_id).ok_or_else(|| DomainError::NotFound {
            entity_type: "plan",
            id: plan_id.to_string(),
        })?;

        if plan.price.for_cycle(cycle) == 0 {
            return Err(DomainError::Validation(format!(
                "Plan '{}' is free and cannot be ordered",
                plan.id
            )));
        }

        Ok(OrderQuote::new(user_id, plan, cycle))
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_catalog_lookups() {
        let catalog = PlanCatalog::reference();

        let pro = catalog.get_plan("pro").unwrap();
        assert_eq!(pro.price.monthly_cents, 1900);
        assert!(catalog.get_plan("enterprise").is_none());

        for feature in FeatureId::ALL {
            assert!(catalog.is_feature_included("pro", feature));
            assert!(!catalog.is_feature_included("free", feature));
            assert!(!catalog.is_feature_included("enterprise", feature));
            assert!(catalog.is_gated(feature));
        }
    }

    #[test]
    fn test_price_for() {
        let catalog = PlanCatalog::reference();
        assert_eq!(catalog.price_for("pro", BillingCycle::Monthly), Some(1900));
        assert_eq!(catalog.price_for("free", BillingCycle::Yearly), Some(0));
        assert_eq!(catalog.price_for("team", BillingCycle::Monthly), None);
    }

    #[test]
    fn test_from_json_with_ungated_feature() {
        let json = r#"{
            "plans": [
                { "id": "free", "name": "Free",
                  "price": { "currency": "EUR", "monthly_cents": 0, "yearly_cents": 0 } },
                { "id": "pro", "name": "Pro",
                  "price": { "currency": "EUR", "monthly_cents": 900, "yearly_cents": 9000 },
                  "features": ["business_plan_generation", "document_export"] }
            ]
        }"#;

        let catalog = PlanCatalog::from_json(json).unwrap();
        assert!(catalog.is_gated(FeatureId::DocumentExport));
        assert!(!catalog.is_gated(FeatureId::DocumentCreation));
        assert_eq!(catalog.get_plan("pro").unwrap().price.currency, "EUR");
    }

    #[test]
    fn test_feature_on_free_plan_is_not_gated() {
        let json = r#"{ "plans": [
            { "id": "free", "name": "Free",
              "price": { "currency": "USD", "monthly_cents": 0, "yearly_cents": 0 },
              "features": ["document_creation"] },
            { "id": "pro", "name": "Pro",
              "price": { "currency": "USD", "monthly_cents": 1900, "yearly_cents": 19000 },
              "features": ["document_creation", "document_export"] } ] }"#;

        let catalog = PlanCatalog::from_json(json).unwrap();
        assert!(!catalog.is_gated(FeatureId::DocumentCreation));
        assert!(catalog.is_gated(FeatureId::DocumentExport));
    }

    #[test]
    fn test_rejects_duplicate_plans() {
        let free = PlanCatalog::reference().plans()[0].clone();
        let err = PlanCatalog::new(vec![free.clone(), free]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicatePlan(id) if id == "free"));
    }

    #[test]
    fn test_rejects_catalog_without_free_plan() {
        let pro = PlanCatalog::reference().plans()[1].clone();
        let err = PlanCatalog::new(vec![pro]).unwrap_err();
        assert!(matches!(err, CatalogError::MissingFreePlan));
    }

    #[test]
    fn test_rejects_unknown_feature_in_json() {
        let json = r#"{ "plans": [ { "id": "free", "name": "Free",
            "price": { "currency": "USD", "monthly_cents": 0, "yearly_cents": 0 },
            "features": ["teleportation"] } ] }"#;
        assert!(matches!(
            PlanCatalog::from_json(json),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_quote() {
        let catalog = PlanCatalog::reference();

        let quote = catalog.quote("user_1", "pro", BillingCycle::Yearly).unwrap();
        assert_eq!(quote.amount_cents, 19000);
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.plan_id, PlanId::pro());

        assert!(matches!(
            catalog.quote("user_1", "free", BillingCycle::Monthly),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            catalog.quote("user_1", "gold", BillingCycle::Monthly),
            Err(DomainError::NotFound { .. })
        ));
    }
}
