//! HTTP adapter for payment confirmation.
//!
//! - `POST /api/payments/webhook` - Signed gateway events
//! - `POST /api/payments/verify` - Checkout widget confirmation

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::SIGNATURE_HEADER;
pub use routes::payment_routes;
