//! Join intent status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of a join intent.
///
/// `Initiated` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinIntentStatus {
    Initiated,
    Paid,
    Failed,
    Expired,
}

impl JoinIntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinIntentStatus::Initiated => "initiated",
            JoinIntentStatus::Paid => "paid",
            JoinIntentStatus::Failed => "failed",
            JoinIntentStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiated" => Some(JoinIntentStatus::Initiated),
            "paid" => Some(JoinIntentStatus::Paid),
            "failed" => Some(JoinIntentStatus::Failed),
            "expired" => Some(JoinIntentStatus::Expired),
            _ => None,
        }
    }
}

impl StateMachine for JoinIntentStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use JoinIntentStatus::*;
        matches!(
            (self, target),
            (Initiated, Paid) | (Initiated, Failed) | (Initiated, Expired)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use JoinIntentStatus::*;
        match self {
            Initiated => vec![Paid, Failed, Expired],
            Paid | Failed | Expired => vec![],
        }
    }
}
