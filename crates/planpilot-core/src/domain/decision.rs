use serde::{Deserialize, Serialize};

/// Why an access decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    Ok,
    RequiresPro,
    UnknownFeature,
}

/// Result of resolving one feature for one user.
///
/// `feature` echoes the identifier exactly as requested so callers can
/// report typos back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub feature: String,
    pub reason: AccessReason,
}

impl AccessDecision {
    pub fn ok(feature: impl Into<String>) -> Self {
        Self {
            allowed: true,
            feature: feature.into(),
            reason: AccessReason::Ok,
        }
    }

    pub fn requires_pro(feature: impl Into<String>) -> Self {
        Self {
            allowed: false,
            feature: feature.into(),
            reason: AccessReason::RequiresPro,
        }
    }

    pub fn unknown_feature(feature: impl Into<String>) -> Self {
        Self {
            allowed: false,
            feature: feature.into(),
            reason: AccessReason::UnknownFeature,
        }
    }
}
