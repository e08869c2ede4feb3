use serde::{Deserialize, Serialize};

/// Severity of a content-screening detection.
///
/// Ordered low to high; `Ord` follows declaration order so
/// `Severity::High > Severity::Low` holds, which the app-verdict
/// arbitration table relies on when comparing `riskiest` detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// The prompt-policy scope a given severity maps to outside data scans.
    /// Low is folded into Medium: both ask, only High notifies.
    pub fn prompt_scope(self) -> PromptScope {
        match self {
            Severity::Low | Severity::Medium => PromptScope::Ask,
            Severity::High => PromptScope::Notify,
        }
    }
}

/// Which flavor of user prompt a detection requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptScope {
    /// `CS_PROMPT_*` — user picks allow/deny/remove.
    Ask,
    /// `CS_NOTIFY_*` — user is notified, confirm maps to deny.
    Notify,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_low_to_high() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn low_folds_into_ask_like_medium() {
        assert_eq!(Severity::Low.prompt_scope(), Severity::Medium.prompt_scope());
        assert_eq!(Severity::Low.prompt_scope(), PromptScope::Ask);
    }

    #[test]
    fn high_is_notify() {
        assert_eq!(Severity::High.prompt_scope(), PromptScope::Notify);
    }
}
