//! Fee & split calculator.
//!
//! Pure functions turning a gross seat price into the platform fee and the
//! owner's net, plus the hold-window release time that decides which earnings
//! bucket the net lands in.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, Percentage, Timestamp};

/// Result of splitting a gross amount between the platform and the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub gross: Money,
    pub fee_percent: Percentage,
    pub fee_amount: Money,
    pub net: Money,
}

impl FeeSplit {
    /// Splits `gross` using `fee = round_half_up(gross * pct / 100)` on minor
    /// units and `net = gross - fee`.
    ///
    /// Negative gross amounts are never produced by the join path; they are
    /// clamped to zero here so the split stays well-defined.
    pub fn compute(gross: Money, fee_percent: Percentage) -> Self {
        let gross = if gross.is_negative() { Money::ZERO } else { gross };
        let scaled = i128::from(gross.minor()) * i128::from(fee_percent.value());
        // Half-up on non-negative integers.
        let fee_minor = ((scaled + 50) / 100) as i64;
        let fee_amount = Money::from_minor(fee_minor);

        Self {
            gross,
            fee_percent,
            fee_amount,
            net: gross - fee_amount,
        }
    }
}

/// Which earnings balance a credited net amount lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsBucket {
    /// Held until `pending_release_at`, then matured on read.
    Pending,
    /// Immediately withdrawable.
    Withdrawable,
}

impl EarningsBucket {
    /// Chooses the bucket from a computed release time.
    pub fn for_release(release_at: Option<Timestamp>) -> Self {
        match release_at {
            Some(_) => EarningsBucket::Pending,
            None => EarningsBucket::Withdrawable,
        }
    }
}

/// Returns `now + hold_hours`, or `None` when the hold window is disabled.
pub fn release_at(now: Timestamp, hold_hours: u32) -> Option<Timestamp> {
    if hold_hours == 0 {
        None
    } else {
        Some(now.plus_hours(i64::from(hold_hours)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pct(v: u8) -> Percentage {
        Percentage::try_new(v).unwrap()
    }

    #[test]
    fn ten_percent_of_200_is_20() {
        let split = FeeSplit::compute(Money::from_minor(200), pct(10));
        assert_eq!(split.fee_amount, Money::from_minor(20));
        assert_eq!(split.net, Money::from_minor(180));
    }

    #[test]
    fn rounds_half_up() {
        // 5 * 10 / 100 = 0.5 -> 1
        assert_eq!(FeeSplit::compute(Money::from_minor(5), pct(10)).fee_amount, Money::from_minor(1));
        // 4 * 10 / 100 = 0.4 -> 0
        assert_eq!(FeeSplit::compute(Money::from_minor(4), pct(10)).fee_amount, Money::ZERO);
        // 15 * 10 / 100 = 1.5 -> 2
        assert_eq!(FeeSplit::compute(Money::from_minor(15), pct(10)).fee_amount, Money::from_minor(2));
    }

    #[test]
    fn zero_percent_keeps_everything_with_owner() {
        let split = FeeSplit::compute(Money::from_minor(999), Percentage::ZERO);
        assert_eq!(split.fee_amount, Money::ZERO);
        assert_eq!(split.net, Money::from_minor(999));
    }

    #[test]
    fn full_cut_leaves_zero_net() {
        let split = FeeSplit::compute(Money::from_minor(999), Percentage::HUNDRED);
        assert_eq!(split.net, Money::ZERO);
    }

    #[test]
    fn free_seat_splits_to_zero() {
        let split = FeeSplit::compute(Money::ZERO, pct(10));
        assert_eq!(split.fee_amount, Money::ZERO);
        assert_eq!(split.net, Money::ZERO);
    }

    #[test]
    fn release_at_is_none_without_hold() {
        assert_eq!(release_at(Timestamp::now(), 0), None);
        assert_eq!(EarningsBucket::for_release(None), EarningsBucket::Withdrawable);
    }

    #[test]
    fn release_at_adds_hold_hours() {
        let now = Timestamp::now();
        let release = release_at(now, 24).unwrap();
        assert_eq!(release, now.plus_hours(24));
        assert_eq!(EarningsBucket::for_release(Some(release)), EarningsBucket::Pending);
    }

    proptest! {
        #[test]
        fn fee_plus_net_equals_gross(gross in 0i64..1_000_000_000_000, p in 0u8..=100) {
            let split = FeeSplit::compute(Money::from_minor(gross), pct(p));
            prop_assert_eq!(split.fee_amount + split.net, split.gross);
            prop_assert!(!split.fee_amount.is_negative());
            prop_assert!(!split.net.is_negative());
        }
    }
}
