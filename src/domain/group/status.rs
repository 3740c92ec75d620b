//! Group lifecycle status.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Status of a subscription-sharing group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Collecting members until every seat is sold.
    Waiting,

    /// All seats sold; the shared subscription period is running.
    Active,

    /// Closed by the owner. No further joins.
    Archived,
}

impl GroupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupStatus::Waiting => "waiting",
            GroupStatus::Active => "active",
            GroupStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(GroupStatus::Waiting),
            "active" => Some(GroupStatus::Active),
            "archived" => Some(GroupStatus::Archived),
            _ => None,
        }
    }
}

impl StateMachine for GroupStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use GroupStatus::*;
        matches!(
            (self, target),
            (Waiting, Active) | (Waiting, Archived) | (Active, Archived)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use GroupStatus::*;
        match self {
            Waiting => vec![Active, Archived],
            Active => vec![Archived],
            Archived => vec![],
        }
    }
}
