//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port for:
//! - Checkout orders for seat purchases
//! - RazorpayX payouts for withdrawals
//!
//! Inbound webhook and checkout signatures are verified in
//! `domain::webhook`, not here.
//!
//! # Configuration
//!
//! Read from the `payment` config section:
//! - `key_id` / `key_secret`: API credentials (orders are disabled without them)
//! - `payout_account_number`: RazorpayX source account (payouts are disabled without it)

mod gateway;
mod mock;

pub use gateway::{RazorpayConfig, RazorpayGateway, DEFAULT_API_BASE_URL};
pub use mock::{MethodCall, MockPaymentGateway};
