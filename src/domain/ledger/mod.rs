//! Ledger primitives.
//!
//! Two balances exist per user: a stored-value wallet and, for group owners,
//! an earnings account fed by seat sales. Both only move through conditional
//! updates performed by the ledger ports.
//!
//! # Module Structure
//!
//! - `wallet` - WalletAccount and its append-only transaction log
//! - `earnings` - EarningsAccount buckets and maturation
//! - `group_transaction` - Seat sale records with their fee split
//! - `errors` - WalletError

mod earnings;
mod errors;
mod group_transaction;
mod wallet;

pub use earnings::{EarningsAccount, MaturationOutcome};
pub use errors::{insufficient_funds, WalletError};
pub(crate) use errors::money_detail;
pub use group_transaction::{GroupTransaction, TransactionStatus};
pub use wallet::{
    Direction, WalletAccount, WalletEntry, WalletMutation, WalletSource, WalletTransaction,
    WalletTransactionFilter,
};
