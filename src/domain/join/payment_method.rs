//! How a join is paid for.

use serde::{Deserialize, Serialize};

/// Payment method chosen when initiating a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit the buyer's wallet synchronously.
    Wallet,
    /// Create a provider order; confirmed later by webhook or verify-payment.
    Gateway,
    /// Development-only confirmation without a provider.
    Dev,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Gateway => "gateway",
            PaymentMethod::Dev => "dev",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wallet" => Some(PaymentMethod::Wallet),
            "gateway" => Some(PaymentMethod::Gateway),
            "dev" => Some(PaymentMethod::Dev),
            _ => None,
        }
    }
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Gateway
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
