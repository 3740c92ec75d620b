//! Withdrawal request aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Money, StateMachine, Timestamp, UserId, ValidationError, WithdrawalId,
};

use super::{PayoutDetails, PayoutMethod, WithdrawalSource, WithdrawalStatus};

/// An owner's request to move funds out to a UPI or bank destination.
///
/// The amount is reserved from the source balance when the request is
/// created; rejection restores exactly that amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub id: WithdrawalId,
    pub owner_id: UserId,
    pub source: WithdrawalSource,
    pub amount: Money,
    pub payout_method: PayoutMethod,
    pub payout_details: PayoutDetails,
    pub status: WithdrawalStatus,
    pub payout_id: Option<String>,
    pub utr: Option<String>,
    pub reject_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WithdrawalRequest {
    pub fn new(
        owner_id: UserId,
        source: WithdrawalSource,
        amount: Money,
        payout_method: PayoutMethod,
        payout_details: PayoutDetails,
        now: Timestamp,
    ) -> Self {
        Self {
            id: WithdrawalId::new(),
            owner_id,
            source,
            amount,
            payout_method,
            payout_details,
            status: WithdrawalStatus::Requested,
            payout_id: None,
            utr: None,
            reject_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    fn move_to(&mut self, target: WithdrawalStatus, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(target)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn approve(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.move_to(WithdrawalStatus::Approved, now)
    }

    pub fn start_processing(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.move_to(WithdrawalStatus::Processing, now)
    }

    /// Records the provider's payout id while the transfer is in flight.
    pub fn record_payout(&mut self, payout_id: impl Into<String>, utr: Option<String>, now: Timestamp) {
        self.payout_id = Some(payout_id.into());
        if utr.is_some() {
            self.utr = utr;
        }
        self.updated_at = now;
    }

    pub fn mark_paid(&mut self, utr: Option<String>, now: Timestamp) -> Result<(), ValidationError> {
        self.move_to(WithdrawalStatus::Paid, now)?;
        if utr.is_some() {
            self.utr = utr;
        }
        Ok(())
    }

    pub fn reject(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), ValidationError> {
        self.move_to(WithdrawalStatus::Rejected, now)?;
        self.reject_reason = Some(reason.into());
        Ok(())
    }
}

/// Filter for listing withdrawal requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WithdrawalFilter {
    pub owner_id: Option<UserId>,
    pub status: Option<WithdrawalStatus>,
    pub source: Option<WithdrawalSource>,
}

impl WithdrawalFilter {
    pub fn for_owner(owner_id: UserId) -> Self {
        Self {
            owner_id: Some(owner_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, request: &WithdrawalRequest) -> bool {
        self.owner_id.map_or(true, |o| o == request.owner_id)
            && self.status.map_or(true, |s| s == request.status)
            && self.source.map_or(true, |s| s == request.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> WithdrawalRequest {
        WithdrawalRequest::new(
            UserId::new(),
            WithdrawalSource::Earnings,
            Money::from_minor(30_000),
            PayoutMethod::Upi,
            PayoutDetails {
                upi_id: Some("owner@okbank".to_string()),
                ..Default::default()
            },
            Timestamp::now(),
        )
    }

    #[test]
    fn new_request_is_open() {
        let r = request();
        assert_eq!(r.status, WithdrawalStatus::Requested);
        assert!(r.is_open());
    }

    #[test]
    fn full_lifecycle_to_paid() {
        let mut r = request();
        let now = Timestamp::now();
        r.approve(now).unwrap();
        r.start_processing(now).unwrap();
        r.record_payout("pout_1", None, now);
        r.mark_paid(Some("UTR123".to_string()), now).unwrap();
        assert_eq!(r.status, WithdrawalStatus::Paid);
        assert_eq!(r.payout_id.as_deref(), Some("pout_1"));
        assert_eq!(r.utr.as_deref(), Some("UTR123"));
    }

    #[test]
    fn paid_request_cannot_be_rejected() {
        let mut r = request();
        let now = Timestamp::now();
        r.approve(now).unwrap();
        r.start_processing(now).unwrap();
        r.mark_paid(None, now).unwrap();
        assert!(r.reject("late", now).is_err());
        assert!(r.reject_reason.is_none());
    }

    #[test]
    fn reject_records_reason() {
        let mut r = request();
        r.reject("Rejected by admin", Timestamp::now()).unwrap();
        assert_eq!(r.reject_reason.as_deref(), Some("Rejected by admin"));
        assert!(!r.is_open());
    }

    #[test]
    fn filter_matches_on_set_fields_only() {
        let r = request();
        assert!(WithdrawalFilter::default().matches(&r));
        assert!(WithdrawalFilter::for_owner(r.owner_id).matches(&r));
        assert!(!WithdrawalFilter::for_owner(UserId::new()).matches(&r));
        let filter = WithdrawalFilter {
            source: Some(WithdrawalSource::Wallet),
            ..Default::default()
        };
        assert!(!filter.matches(&r));
    }
}
