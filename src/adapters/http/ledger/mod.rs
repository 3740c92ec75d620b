//! HTTP adapter for owner earnings and user wallets.
//!
//! - `GET /api/earnings/summary` - Balances (matures due holds first)
//! - `GET /api/earnings/transactions` - Paid seat sales
//! - `GET /api/wallet` - Wallet balance
//! - `GET /api/wallet/transactions` - Wallet history with filters
//! - `POST /api/wallet/topup` - Wallet top-up

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{earnings_routes, wallet_routes};
