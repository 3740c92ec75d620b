//! Withdrawal domain module.
//!
//! Owners withdraw from their wallet or earnings balance. Funds are reserved
//! when the request is made and restored exactly if it is rejected or the
//! payout definitively fails.
//!
//! # Module Structure
//!
//! - `status` - WithdrawalStatus state machine
//! - `source` - Wallet or earnings
//! - `payout` - Payout method, raw details and validated destination
//! - `aggregate` - WithdrawalRequest and list filter
//! - `errors` - WithdrawalError

mod aggregate;
mod errors;
mod payout;
mod source;
mod status;

pub use aggregate::{WithdrawalFilter, WithdrawalRequest};
pub use errors::WithdrawalError;
pub use payout::{PayoutDestination, PayoutDetails, PayoutMethod};
pub use source::WithdrawalSource;
pub use status::WithdrawalStatus;
