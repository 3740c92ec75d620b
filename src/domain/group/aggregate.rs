//! Group aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GroupId, Money, StateMachine, Timestamp, UserId, ValidationError};

use super::GroupStatus;

/// A shared-subscription group selling a fixed number of seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,

    pub name: String,

    /// The user who created the group. Earnings go to the owner membership,
    /// which normally belongs to this user.
    pub created_by: UserId,

    /// Price of one seat.
    pub share_price: Money,

    /// Number of seats that fill the group.
    pub share_limit: u32,

    /// Seats sold so far (owner included when the owner holds a seat).
    pub member_count: u32,

    pub status: GroupStatus,

    /// Length of the shared subscription period once active.
    pub duration_days: u32,

    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,

    /// Whether non-owner members may issue invites.
    pub allow_member_invites: bool,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Group {
    /// Creates a new waiting group.
    pub fn new(
        name: impl Into<String>,
        created_by: UserId,
        share_price: Money,
        share_limit: u32,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        if share_price.is_negative() {
            return Err(ValidationError::invalid_format("share_price", "cannot be negative"));
        }
        if share_limit == 0 {
            return Err(ValidationError::out_of_range("share_limit", 1, i32::MAX, 0));
        }

        Ok(Self {
            id: GroupId::new(),
            name,
            created_by,
            share_price,
            share_limit,
            member_count: 0,
            status: GroupStatus::Waiting,
            duration_days: 30,
            start_date: None,
            end_date: None,
            allow_member_invites: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Seats still available, floored at zero.
    pub fn seats_left(&self) -> u32 {
        self.share_limit.saturating_sub(self.member_count)
    }

    pub fn is_full(&self) -> bool {
        self.seats_left() == 0
    }

    pub fn is_free(&self) -> bool {
        self.share_price.is_zero()
    }

    /// Records one newly created membership.
    ///
    /// Increments `member_count`; when the count reaches `share_limit` while
    /// the group is still waiting, activates it with
    /// `end_date = start_date + duration_days`. Returns true when this join
    /// activated the group.
    pub fn record_join(&mut self, now: Timestamp) -> bool {
        self.member_count += 1;
        self.updated_at = now;

        if self.member_count >= self.share_limit && self.status == GroupStatus::Waiting {
            // Waiting -> Active is always a declared edge.
            self.status = GroupStatus::Active;
            self.start_date = Some(now);
            self.end_date = Some(now.plus_days(i64::from(self.duration_days)));
            return true;
        }
        false
    }

    /// Archives the group.
    pub fn archive(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(GroupStatus::Archived)?;
        self.updated_at = now;
        Ok(())
    }
}
