//! Webhook domain module.
//!
//! Signature verification and event parsing for payment gateway callbacks.
//! Routing a verified capture to a purchase lives in the application layer.

mod errors;
mod event;
mod outcome;
mod signature;

pub use errors::WebhookError;
pub use event::{CapturedPayment, GatewayEvent, GatewayEventKind};
pub use outcome::{WebhookAck, WebhookOutcome};
pub use signature::{checkout_message, sign_hex, SignatureVerifier};
