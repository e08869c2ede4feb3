use serde::{Deserialize, Serialize};

/// Recorded outcome of the user-prompt policy for a single detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserResponse {
    /// `ask_user = no`: the detection was returned as-is, no prompt issued.
    NotAsked,
    /// User chose to remove the target (file deletion / app uninstall).
    Remove,
    /// User allowed the flagged content/URL to proceed.
    ProcessingAllowed,
    /// User disallowed the flagged content/URL.
    ProcessingDisallowed,
}

impl UserResponse {
    pub fn is_terminal_remove(self) -> bool {
        matches!(self, UserResponse::Remove)
    }
}
