//! State machine trait for status enums.
//!
//! Join intents, withdrawals, groups and ledger rows all move through closed
//! lifecycles. Each status enum declares its edges once and gets validated
//! transitions from this trait.

use super::ValidationError;

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for JoinIntentStatus {
///     fn can_transition_to(&self, target: &Self) -> bool {
///         matches!((self, target), (Initiated, Paid) | (Initiated, Failed) | (Initiated, Expired))
///     }
///
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Initiated => vec![Paid, Failed, Expired],
///             Paid | Failed | Expired => vec![],
///         }
///     }
/// }
///
/// let next = intent.status.transition_to(JoinIntentStatus::Paid)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Ticket {
        Open,
        Held,
        Settled,
        Voided,
    }

    impl StateMachine for Ticket {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Ticket::*;
            matches!(
                (self, target),
                (Open, Held) | (Open, Voided) | (Held, Settled) | (Held, Voided)
            )
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Ticket::*;
            match self {
                Open => vec![Held, Voided],
                Held => vec![Settled, Voided],
                Settled | Voided => vec![],
            }
        }
    }

    #[test]
    fn transition_to_succeeds_for_declared_edge() {
        assert_eq!(Ticket::Open.transition_to(Ticket::Held), Ok(Ticket::Held));
    }

    #[test]
    fn transition_to_fails_for_undeclared_edge() {
        let err = Ticket::Open.transition_to(Ticket::Settled).unwrap_err();
        assert!(err.to_string().contains("Open"));
    }

    #[test]
    fn states_without_edges_are_terminal() {
        assert!(Ticket::Settled.is_terminal());
        assert!(Ticket::Voided.is_terminal());
        assert!(!Ticket::Held.is_terminal());
    }
}
