//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `memory` - Single-lock in-memory store backing every repository port
//! - `postgres` - sqlx repositories with conditional updates
//! - `razorpay` - Payment gateway (orders and payouts) plus a mock
//! - `settings` - In-process platform settings source
//! - `http` - axum routes, extractors and error mapping

pub mod http;
pub mod memory;
pub mod postgres;
pub mod razorpay;
pub mod settings;

pub use memory::InMemoryStore;
pub use razorpay::{MockPaymentGateway, RazorpayConfig, RazorpayGateway};
pub use settings::SharedSettings;
