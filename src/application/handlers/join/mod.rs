//! Join handlers.
//!
//! ## Commands
//! - Initiating a join through an invite code
//! - Buying a seat directly
//! - Confirming a dev-mode join
//! - Expiring a stale join intent
//!
//! Every confirmation path ends in [`JoinFinalizer`].

mod confirm_dev_join;
mod expire_join_intent;
mod finalizer;
mod initiate_direct_purchase;
mod initiate_join;

pub use confirm_dev_join::{ConfirmDevJoinCommand, ConfirmDevJoinHandler, ConfirmDevJoinResult};
pub use expire_join_intent::{
    ExpireJoinIntentCommand, ExpireJoinIntentHandler, ExpireJoinIntentResult,
};
pub use finalizer::{FinalizeJoinCommand, FinalizeJoinResult, FinalizeSource, JoinFinalizer};
pub use initiate_direct_purchase::{
    InitiateDirectPurchaseCommand, InitiateDirectPurchaseHandler, InitiateDirectPurchaseResult,
};
pub use initiate_join::{InitiateJoinCommand, InitiateJoinHandler, InitiateJoinResult};
