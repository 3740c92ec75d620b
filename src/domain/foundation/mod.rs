//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the state machine trait and error
//! types that form the vocabulary of the seat-sharing ledger.

mod errors;
mod ids;
mod money;
mod percentage;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{
    GroupId, InviteId, JoinIntentId, MembershipId, TransactionId, UserId, WalletId,
    WalletTransactionId, WithdrawalId,
};
pub use money::Money;
pub use percentage::Percentage;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
