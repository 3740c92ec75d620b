//! Gateway signature verification.
//!
//! Two signatures are checked with HMAC-SHA256:
//! - webhook deliveries, signed over the raw request body with the webhook secret
//! - checkout confirmations, signed over `"<order_id>|<payment_id>"` with the API key secret

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::WebhookError;

/// Computes a lowercase hex HMAC-SHA256 of `message` under `secret`.
pub fn sign_hex(secret: &str, message: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Message signed by the gateway for a checkout confirmation.
pub fn checkout_message(order_id: &str, payment_id: &str) -> String {
    format!("{}|{}", order_id, payment_id)
}

/// Verifier for gateway signatures.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: String,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// True when no secret is configured.
    pub fn is_unconfigured(&self) -> bool {
        self.secret.is_empty()
    }

    /// Verifies a hex signature over `payload`.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` - header absent or blank
    /// - `InvalidSignature` - not hex, or does not match
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookError::MissingSignature)?;
        let provided = hex::decode(signature).map_err(|_| WebhookError::InvalidSignature)?;

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Verifies a checkout confirmation signature.
    pub fn verify_checkout(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), WebhookError> {
        self.verify(checkout_message(order_id, payment_id).as_bytes(), Some(signature))
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
