//! Money value object.
//!
//! Amounts are whole currency minor units (paise). Ledger code never touches
//! floating point.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

use super::ValidationError;

/// An amount of money in currency minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Self = Self(0);

    /// Creates an amount from minor units.
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount that must be strictly positive.
    pub fn positive(minor: i64) -> Result<Self, ValidationError> {
        if minor <= 0 {
            return Err(ValidationError::invalid_format(
                "amount",
                "must be greater than zero",
            ));
        }
        Ok(Self(minor))
    }

    /// Returns the amount in minor units.
    pub const fn minor(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiplies by an integer factor (used for totals across seats).
    pub fn times(self, factor: i64) -> Money {
        Money(self.0 * factor)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_and_negative() {
        assert!(Money::positive(0).is_err());
        assert!(Money::positive(-5).is_err());
        assert_eq!(Money::positive(5).unwrap().minor(), 5);
    }

    #[test]
    fn display_formats_major_and_minor_units() {
        assert_eq!(Money::from_minor(18000).to_string(), "180.00");
        assert_eq!(Money::from_minor(5).to_string(), "0.05");
        assert_eq!(Money::from_minor(-250).to_string(), "-2.50");
    }

    #[test]
    fn checked_sub_detects_overflow_only() {
        assert_eq!(
            Money::from_minor(100).checked_sub(Money::from_minor(400)),
            Some(Money::from_minor(-300))
        );
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(Money::from_minor(1)), None);
    }

    #[test]
    fn sums_over_iterators() {
        let total: Money = [100, 200, 300].into_iter().map(Money::from_minor).sum();
        assert_eq!(total, Money::from_minor(600));
    }
}
