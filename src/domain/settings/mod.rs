//! Money-movement settings.
//!
//! The values an operator can change at runtime. Handlers receive them
//! through the `PlatformSettingsSource` port and read them once per
//! operation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, Percentage};
use crate::domain::withdrawal::WithdrawalSource;

/// Settings that affect fee splits, holds and withdrawals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSettings {
    /// Platform cut applied to every seat sale.
    pub platform_cut_percent: Percentage,

    /// Smallest withdrawal an owner may request.
    pub min_withdrawal: Money,

    /// Earnings hold window in hours; zero credits straight to withdrawable.
    pub hold_hours: u32,

    pub wallet_withdrawals_enabled: bool,
    pub earnings_withdrawals_enabled: bool,

    /// Lifetime of a newly issued invite when no expiry is given.
    pub invite_ttl_minutes: u32,

    pub min_topup: Money,
    pub max_topup: Money,
    pub max_wallet_balance: Money,

    /// Whether the `dev` payment method may be used.
    pub allow_dev_payments: bool,

    /// Currency code sent to the payment gateway.
    pub currency: String,
}

impl PlatformSettings {
    /// Returns whether withdrawals from the given source are open.
    pub fn withdrawals_enabled(&self, source: WithdrawalSource) -> bool {
        match source {
            WithdrawalSource::Wallet => self.wallet_withdrawals_enabled,
            WithdrawalSource::Earnings => self.earnings_withdrawals_enabled,
        }
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            platform_cut_percent: Percentage::try_new(10).unwrap_or_default(),
            min_withdrawal: Money::from_minor(10_000),
            hold_hours: 0,
            wallet_withdrawals_enabled: false,
            earnings_withdrawals_enabled: true,
            invite_ttl_minutes: 60,
            min_topup: Money::from_minor(1_000),
            max_topup: Money::from_minor(1_000_000),
            max_wallet_balance: Money::from_minor(10_000_000),
            allow_dev_payments: true,
            currency: "INR".to_string(),
        }
    }
}
