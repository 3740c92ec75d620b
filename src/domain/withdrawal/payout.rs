//! Payout destinations.

use serde::{Deserialize, Serialize};

use super::WithdrawalError;

/// How the owner wants to be paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    Upi,
    Bank,
}

impl PayoutMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutMethod::Upi => "upi",
            PayoutMethod::Bank => "bank",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "upi" => Some(PayoutMethod::Upi),
            "bank" => Some(PayoutMethod::Bank),
            _ => None,
        }
    }
}

/// Free-form payout fields as submitted by the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ifsc_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_holder: Option<String>,
}

/// A validated destination the payout provider can send money to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutDestination {
    Upi {
        vpa: String,
    },
    Bank {
        account_number: String,
        ifsc: String,
        holder: Option<String>,
    },
}

impl PayoutDestination {
    /// Transfer mode the provider should use.
    pub fn mode(&self) -> &'static str {
        match self {
            PayoutDestination::Upi { .. } => "UPI",
            PayoutDestination::Bank { .. } => "NEFT",
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PayoutDetails {
    /// Checks that the fields required by `method` are present.
    pub fn destination(&self, method: PayoutMethod) -> Result<PayoutDestination, WithdrawalError> {
        match method {
            PayoutMethod::Upi => {
                let vpa = non_blank(&self.upi_id)
                    .ok_or_else(|| WithdrawalError::payout_details("upi_id", "UPI ID is required"))?;
                Ok(PayoutDestination::Upi { vpa })
            }
            PayoutMethod::Bank => {
                let account_number = non_blank(&self.account_number).ok_or_else(|| {
                    WithdrawalError::payout_details("account_number", "Bank account number is required")
                })?;
                let ifsc = non_blank(&self.ifsc_code).ok_or_else(|| {
                    WithdrawalError::payout_details("ifsc_code", "IFSC code is required")
                })?;
                Ok(PayoutDestination::Bank {
                    account_number,
                    ifsc: ifsc.to_uppercase(),
                    holder: non_blank(&self.account_holder),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upi_requires_upi_id() {
        let details = PayoutDetails::default();
        assert!(details.destination(PayoutMethod::Upi).is_err());

        let details = PayoutDetails {
            upi_id: Some("owner@okbank".to_string()),
            ..Default::default()
        };
        assert_eq!(
            details.destination(PayoutMethod::Upi).unwrap(),
            PayoutDestination::Upi {
                vpa: "owner@okbank".to_string()
            }
        );
    }

    #[test]
    fn bank_requires_account_and_ifsc() {
        let details = PayoutDetails {
            account_number: Some("1234567890".to_string()),
            ..Default::default()
        };
        let err = details.destination(PayoutMethod::Bank).unwrap_err();
        assert!(err.message().contains("IFSC"));

        let details = PayoutDetails {
            account_number: Some("1234567890".to_string()),
            ifsc_code: Some("hdfc0000123".to_string()),
            ..Default::default()
        };
        let dest = details.destination(PayoutMethod::Bank).unwrap();
        assert_eq!(dest.mode(), "NEFT");
        assert!(matches!(dest, PayoutDestination::Bank { ref ifsc, .. } if ifsc == "HDFC0000123"));
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let details = PayoutDetails {
            upi_id: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(details.destination(PayoutMethod::Upi).is_err());
    }
}
