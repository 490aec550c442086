use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a chat request.
///
/// ```text
/// PENDING ──► PROCESSING ──► COMPLETED
///    │             │
///    └─────────────┴───────► FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ChatStatus {
    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ChatStatus) -> bool {
        match self {
            ChatStatus::Pending => matches!(next, ChatStatus::Processing | ChatStatus::Failed),
            ChatStatus::Processing => matches!(next, ChatStatus::Completed | ChatStatus::Failed),
            ChatStatus::Completed | ChatStatus::Failed => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatStatus::Completed | ChatStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatStatus::Pending => "PENDING",
            ChatStatus::Processing => "PROCESSING",
            ChatStatus::Completed => "COMPLETED",
            ChatStatus::Failed => "FAILED",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ChatStatus::Pending => "pending",
            ChatStatus::Processing => "processing",
            ChatStatus::Completed => "completed",
            ChatStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ChatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
