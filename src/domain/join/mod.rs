//! Join domain module.
//!
//! A join intent records a user's attempt to buy a seat through an invite.
//! It starts `initiated` and ends `paid`, `failed` or `expired`; finalization
//! into a membership and a seat sale happens exactly once per payment id.

mod aggregate;
mod errors;
mod payment_method;
mod status;

pub use aggregate::{dev_payment_id, wallet_payment_id, JoinIntent};
pub use errors::JoinError;
pub use payment_method::PaymentMethod;
pub use status::JoinIntentStatus;
