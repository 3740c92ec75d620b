//! Earnings handlers.
//!
//! ## Queries
//! - Summary (matures held earnings on read)
//! - Seat sales owned by the caller

mod get_earnings_summary;
mod list_earnings_transactions;

pub use get_earnings_summary::{EarningsSummary, GetEarningsSummaryHandler, GetEarningsSummaryQuery};
pub use list_earnings_transactions::{
    ListEarningsTransactionsHandler, ListEarningsTransactionsQuery,
};
