//! Wallet handlers.
//!
//! ## Queries
//! - Current balance
//! - Transaction history with filters
//!
//! ## Commands
//! - Top-up

mod get_wallet;
mod list_wallet_transactions;
mod top_up_wallet;

pub use get_wallet::{GetWalletHandler, GetWalletQuery, GetWalletResult};
pub use list_wallet_transactions::{ListWalletTransactionsHandler, ListWalletTransactionsQuery};
pub use top_up_wallet::{TopUpWalletCommand, TopUpWalletHandler, TopUpWalletResult};
