//! Payment gateway configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Razorpay credentials and payout settings.
///
/// Empty credentials leave the gateway unconfigured: orders and payouts
/// then take the dev path. Production requires all three secrets.
#[derive(Clone, Deserialize)]
pub struct PaymentConfig {
    #[serde(default)]
    pub key_id: String,

    #[serde(default = "empty_secret")]
    pub key_secret: SecretString,

    /// Secret for `X-Razorpay-Signature` on webhooks.
    #[serde(default = "empty_secret")]
    pub webhook_secret: SecretString,

    /// RazorpayX account; payouts run in dev mode without it.
    pub payout_account_number: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_currency")]
    pub currency: String,
}

impl PaymentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// True when the key id belongs to Razorpay test mode.
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    /// Validate payment configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        use secrecy::ExposeSecret;

        if *environment == Environment::Production {
            if self.key_id.is_empty() {
                return Err(ValidationError::MissingRequired("PAYMENT__KEY_ID"));
            }
            if self.key_secret.expose_secret().is_empty() {
                return Err(ValidationError::MissingRequired("PAYMENT__KEY_SECRET"));
            }
            if self.webhook_secret.expose_secret().is_empty() {
                return Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_SECRET"));
            }
        }
        if !self.key_id.is_empty() && !self.key_id.starts_with("rzp_") {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        let currency_ok =
            self.currency.len() == 3 && self.currency.chars().all(|c| c.is_ascii_uppercase());
        if !currency_ok {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            key_id: String::new(),
            key_secret: empty_secret(),
            webhook_secret: empty_secret(),
            payout_account_number: None,
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            currency: default_currency(),
        }
    }
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .field("payout_account_number", &self.payout_account_number)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("currency", &self.currency)
            .finish()
    }
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_api_base_url() -> String {
    crate::adapters::razorpay::DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_currency() -> String {
    "INR".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> PaymentConfig {
        PaymentConfig {
            key_id: "rzp_test_abcd1234".to_string(),
            key_secret: SecretString::new("secret".to_string()),
            webhook_secret: SecretString::new("whsecret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unconfigured_is_fine_in_development() {
        assert!(PaymentConfig::default()
            .validate(&Environment::Development)
            .is_ok());
    }

    #[test]
    fn test_production_requires_credentials() {
        assert_eq!(
            PaymentConfig::default().validate(&Environment::Production),
            Err(ValidationError::MissingRequired("PAYMENT__KEY_ID"))
        );
        assert!(configured().validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_key_prefix_is_checked() {
        let config = PaymentConfig {
            key_id: "sk_test_xxx".to_string(),
            ..configured()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidGatewayKey)
        );
    }

    #[test]
    fn test_timeout_bounds() {
        let config = PaymentConfig {
            request_timeout_secs: 0,
            ..configured()
        };
        assert!(config.validate(&Environment::Development).is_err());

        let config = PaymentConfig {
            request_timeout_secs: 121,
            ..configured()
        };
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_currency_must_be_an_iso_code() {
        let config = PaymentConfig {
            currency: "rupees".to_string(),
            ..configured()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::InvalidCurrency("rupees".to_string()))
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", configured());
        assert!(!rendered.contains("whsecret"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(configured().is_test_mode());
    }
}
