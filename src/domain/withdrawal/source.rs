//! Which balance a withdrawal draws from.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalSource {
    Wallet,
    Earnings,
}

impl WithdrawalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalSource::Wallet => "wallet",
            WithdrawalSource::Earnings => "earnings",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "wallet" => Some(WithdrawalSource::Wallet),
            "earnings" => Some(WithdrawalSource::Earnings),
            _ => None,
        }
    }
}

impl Default for WithdrawalSource {
    fn default() -> Self {
        WithdrawalSource::Earnings
    }
}

impl std::fmt::Display for WithdrawalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
