use serde::{Deserialize, Serialize};

use crate::response::UserResponse;

/// Risk level reported by the web-protection engine for a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Risk {
    Unverified,
    Low,
    Medium,
    High,
}

/// Stateless URL verdict — URL checks are never persisted, unlike content
/// detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlVerdict {
    pub risk: Risk,
    pub detailed_url: String,
    pub user_response: UserResponse,
}

impl UrlVerdict {
    pub fn new(risk: Risk, detailed_url: impl Into<String>) -> Self {
        Self {
            risk,
            detailed_url: detailed_url.into(),
            user_response: UserResponse::NotAsked,
        }
    }

    /// True when this risk level is returned as-is with no user prompt.
    pub fn is_passthrough(risk: Risk) -> bool {
        matches!(risk, Risk::Unverified | Risk::Low)
    }
}
