//! Withdrawal status state machine.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// Lifecycle of a withdrawal request.
///
/// ```text
/// requested ──► approved ──► processing ──► paid
///     │             │             │
///     └─────────────┴─────────────┴──────► rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    Requested,
    Approved,
    Processing,
    Paid,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Requested => "requested",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Paid => "paid",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "requested" => Some(WithdrawalStatus::Requested),
            "approved" => Some(WithdrawalStatus::Approved),
            "processing" => Some(WithdrawalStatus::Processing),
            "paid" => Some(WithdrawalStatus::Paid),
            "rejected" => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }

    /// Statuses that still hold reserved funds.
    pub const OPEN: [WithdrawalStatus; 3] = [
        WithdrawalStatus::Requested,
        WithdrawalStatus::Approved,
        WithdrawalStatus::Processing,
    ];

    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl StateMachine for WithdrawalStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, target),
            (Requested, Approved)
                | (Requested, Rejected)
                | (Approved, Processing)
                | (Approved, Rejected)
                | (Processing, Paid)
                | (Processing, Rejected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use WithdrawalStatus::*;
        match self {
            Requested => vec![Approved, Rejected],
            Approved => vec![Processing, Rejected],
            Processing => vec![Paid, Rejected],
            Paid | Rejected => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WithdrawalStatus::*;

    #[test]
    fn happy_path_is_linear() {
        assert!(Requested.can_transition_to(&Approved));
        assert!(Approved.can_transition_to(&Processing));
        assert!(Processing.can_transition_to(&Paid));
        assert!(!Requested.can_transition_to(&Paid));
        assert!(!Requested.can_transition_to(&Processing));
    }

    #[test]
    fn every_open_state_can_be_rejected() {
        for status in WithdrawalStatus::OPEN {
            assert!(status.can_transition_to(&Rejected), "{:?}", status);
            assert!(status.is_open());
        }
    }

    #[test]
    fn paid_is_never_rejected() {
        assert!(Paid.is_terminal());
        assert!(Paid.transition_to(Rejected).is_err());
        assert!(!Paid.is_open());
        assert!(!Rejected.is_open());
    }
}
