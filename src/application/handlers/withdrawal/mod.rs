//! Withdrawal handlers.
//!
//! ## Commands
//! - Requesting a withdrawal (reserves funds)
//! - Approving and paying out
//! - Rejecting with refund
//! - Settling an in-flight payout
//!
//! ## Queries
//! - Listing requests for an owner or operator

mod approve_withdrawal;
mod list_withdrawals;
mod reject_withdrawal;
mod request_withdrawal;
mod settle_withdrawal;

pub use approve_withdrawal::{
    ApproveWithdrawalCommand, ApproveWithdrawalHandler, ApproveWithdrawalResult, PayoutOutcome,
};
pub use list_withdrawals::{ListWithdrawalsHandler, ListWithdrawalsQuery};
pub use reject_withdrawal::{RejectWithdrawalCommand, RejectWithdrawalHandler, RejectWithdrawalResult};
pub use request_withdrawal::{
    RequestWithdrawalCommand, RequestWithdrawalHandler, RequestWithdrawalResult,
};
pub use settle_withdrawal::{SettleWithdrawalCommand, SettleWithdrawalHandler, SettleWithdrawalResult};
