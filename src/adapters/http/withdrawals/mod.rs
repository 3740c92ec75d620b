//! HTTP adapter for withdrawals.
//!
//! Owner:
//! - `POST /api/withdrawals` - Request a withdrawal (reserves the amount)
//! - `GET /api/withdrawals/mine` - Own requests
//!
//! Operator (`X-User-Role: admin`):
//! - `GET /api/admin/withdrawals` - All requests
//! - `POST /api/admin/withdrawals/:id/approve` - Approve and pay out
//! - `POST /api/admin/withdrawals/:id/reject` - Reject and refund
//! - `POST /api/admin/withdrawals/:id/settle` - Mark an in-flight payout paid

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{admin_withdrawal_routes, withdrawal_routes};
