//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod earnings;
pub mod invite;
pub mod join;
pub mod payments;
pub mod wallet;
pub mod withdrawal;

#[cfg(test)]
pub(crate) mod fixtures;

pub use earnings::{
    EarningsSummary, GetEarningsSummaryHandler, GetEarningsSummaryQuery,
    ListEarningsTransactionsHandler, ListEarningsTransactionsQuery,
};
pub use invite::{
    IssueInviteCommand, IssueInviteHandler, IssueInviteResult, ResolveInviteHandler,
    ResolveInviteQuery, ResolveInviteResult,
};
pub use join::{
    ConfirmDevJoinCommand, ConfirmDevJoinHandler, ConfirmDevJoinResult, ExpireJoinIntentCommand,
    ExpireJoinIntentHandler, ExpireJoinIntentResult, FinalizeJoinCommand, FinalizeJoinResult,
    FinalizeSource, InitiateDirectPurchaseCommand, InitiateDirectPurchaseHandler,
    InitiateDirectPurchaseResult, InitiateJoinCommand, InitiateJoinHandler, InitiateJoinResult,
    JoinFinalizer,
};
pub use payments::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, VerifyPaymentCommand,
    VerifyPaymentHandler, VerifyPaymentResult,
};
pub use wallet::{
    GetWalletHandler, GetWalletQuery, GetWalletResult, ListWalletTransactionsHandler,
    ListWalletTransactionsQuery, TopUpWalletCommand, TopUpWalletHandler, TopUpWalletResult,
};
pub use withdrawal::{
    ApproveWithdrawalCommand, ApproveWithdrawalHandler, ApproveWithdrawalResult,
    ListWithdrawalsHandler, ListWithdrawalsQuery, PayoutOutcome, RejectWithdrawalCommand,
    RejectWithdrawalHandler, RejectWithdrawalResult, RequestWithdrawalCommand,
    RequestWithdrawalHandler, RequestWithdrawalResult, SettleWithdrawalCommand,
    SettleWithdrawalHandler, SettleWithdrawalResult,
};
