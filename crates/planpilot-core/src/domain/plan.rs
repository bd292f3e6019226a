use std::fmt;

use serde::{Deserialize, Serialize};

use super::feature::FeatureId;

/// Identifier of a catalog plan, e.g. `free` or `pro`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    pub const FREE: &'static str = "free";
    pub const PRO: &'static str = "pro";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn free() -> Self {
        Self::new(Self::FREE)
    }

    pub fn pro() -> Self {
        Self::new(Self::PRO)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlanId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// How often a paid plan is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(BillingCycle::Monthly),
            "yearly" => Some(BillingCycle::Yearly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

/// Price of a plan in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPrice {
    pub currency: String,
    pub monthly_cents: u64,
    pub yearly_cents: u64,
}

impl PlanPrice {
    pub fn zero(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            monthly_cents: 0,
            yearly_cents: 0,
        }
    }

    pub fn for_cycle(&self, cycle: BillingCycle) -> u64 {
        match cycle {
            BillingCycle::Monthly => self.monthly_cents,
            BillingCycle::Yearly => self.yearly_cents,
        }
    }

    pub fn is_free(&self) -> bool {
        self.monthly_cents == 0 && self.yearly_cents == 0
    }
}

/// A catalog entry. Immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub price: PlanPrice,
    /// Features this plan unlocks, in display order.
    #[serde(default)]
    pub features: Vec<FeatureId>,
}

impl Plan {
    pub fn includes(&self, feature: FeatureId) -> bool {
        self.features.contains(&feature)
    }
}
