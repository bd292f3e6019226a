use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Capabilities a plan can unlock.
///
/// The set is closed: anything that does not parse into one of these
/// variants is an unknown feature and is always denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureId {
    BusinessPlanGeneration,
    GrantProposalCreation,
    DocumentCreation,
    DocumentExport,
}

impl FeatureId {
    /// Every feature, in declaration order.
    pub const ALL: [FeatureId; 4] = [
        FeatureId::BusinessPlanGeneration,
        FeatureId::GrantProposalCreation,
        FeatureId::DocumentCreation,
        FeatureId::DocumentExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureId::BusinessPlanGeneration => "business_plan_generation",
            FeatureId::GrantProposalCreation => "grant_proposal_creation",
            FeatureId::DocumentCreation => "document_creation",
            FeatureId::DocumentExport => "document_export",
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a member of the feature set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureId {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureId::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_features() {
        for feature in FeatureId::ALL {
            assert_eq!(feature.as_str().parse::<FeatureId>(), Ok(feature));
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Document_Export".parse::<FeatureId>().is_err());
        assert!("".parse::<FeatureId>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&FeatureId::GrantProposalCreation).unwrap();
        assert_eq!(json, "\"grant_proposal_creation\"");
    }
}
