//! Payment confirmation handlers.
//!
//! ## Commands
//! - Ingesting gateway webhooks
//! - Verifying a checkout signature posted by the client

mod capture;
mod handle_gateway_webhook;
mod verify_payment;

pub use handle_gateway_webhook::{HandleGatewayWebhookCommand, HandleGatewayWebhookHandler};
pub use verify_payment::{VerifyPaymentCommand, VerifyPaymentHandler, VerifyPaymentResult};
