//! Platform money settings loaded at startup.

use serde::Deserialize;

use crate::domain::foundation::{Money, Percentage};
use crate::domain::settings::PlatformSettings;

use super::error::ValidationError;

/// Initial values for the runtime-adjustable money settings.
///
/// Amounts are minor currency units.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_platform_cut")]
    pub platform_cut_percent: u8,

    #[serde(default = "default_min_withdrawal")]
    pub min_withdrawal: i64,

    /// Zero disables the hold window.
    #[serde(default)]
    pub hold_hours: u32,

    #[serde(default)]
    pub wallet_withdrawals_enabled: bool,

    #[serde(default = "default_true")]
    pub earnings_withdrawals_enabled: bool,

    #[serde(default = "default_invite_ttl")]
    pub invite_ttl_minutes: u32,

    #[serde(default = "default_min_topup")]
    pub min_topup: i64,

    #[serde(default = "default_max_topup")]
    pub max_topup: i64,

    #[serde(default = "default_max_wallet_balance")]
    pub max_wallet_balance: i64,

    /// Ignored in production.
    #[serde(default = "default_true")]
    pub allow_dev_payments: bool,
}

impl PlatformConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.platform_cut_percent > 100 {
            return Err(ValidationError::InvalidPlatformCut(self.platform_cut_percent));
        }
        if self.min_withdrawal <= 0 {
            return Err(ValidationError::InvalidAmount("min_withdrawal"));
        }
        if self.min_topup <= 0 || self.min_topup > self.max_topup {
            return Err(ValidationError::InvalidAmount("min_topup"));
        }
        if self.max_wallet_balance < self.max_topup {
            return Err(ValidationError::InvalidAmount("max_wallet_balance"));
        }
        if self.invite_ttl_minutes == 0 {
            return Err(ValidationError::InvalidAmount("invite_ttl_minutes"));
        }
        Ok(())
    }

    /// Builds the settings handlers read, forcing dev payments off in
    /// production.
    pub fn to_settings(
        &self,
        currency: &str,
        production: bool,
    ) -> Result<PlatformSettings, ValidationError> {
        let platform_cut_percent = Percentage::try_new(self.platform_cut_percent)
            .map_err(|_| ValidationError::InvalidPlatformCut(self.platform_cut_percent))?;

        Ok(PlatformSettings {
            platform_cut_percent,
            min_withdrawal: Money::from_minor(self.min_withdrawal),
            hold_hours: self.hold_hours,
            wallet_withdrawals_enabled: self.wallet_withdrawals_enabled,
            earnings_withdrawals_enabled: self.earnings_withdrawals_enabled,
            invite_ttl_minutes: self.invite_ttl_minutes,
            min_topup: Money::from_minor(self.min_topup),
            max_topup: Money::from_minor(self.max_topup),
            max_wallet_balance: Money::from_minor(self.max_wallet_balance),
            allow_dev_payments: self.allow_dev_payments && !production,
            currency: currency.to_string(),
        })
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            platform_cut_percent: default_platform_cut(),
            min_withdrawal: default_min_withdrawal(),
            hold_hours: 0,
            wallet_withdrawals_enabled: false,
            earnings_withdrawals_enabled: true,
            invite_ttl_minutes: default_invite_ttl(),
            min_topup: default_min_topup(),
            max_topup: default_max_topup(),
            max_wallet_balance: default_max_wallet_balance(),
            allow_dev_payments: true,
        }
    }
}

fn default_platform_cut() -> u8 {
    10
}

fn default_min_withdrawal() -> i64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_invite_ttl() -> u32 {
    60
}

fn default_min_topup() -> i64 {
    1_000
}

fn default_max_topup() -> i64 {
    1_000_000
}

fn default_max_wallet_balance() -> i64 {
    10_000_000
}
