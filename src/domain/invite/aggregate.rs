//! Group invite aggregate.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GroupId, InviteId, Timestamp, UserId};
use crate::domain::group::MemberRole;

use super::{InviteCode, InviteError};

/// Lifecycle status of an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Active,
    Disabled,
    Pending,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Active => "active",
            InviteStatus::Disabled => "disabled",
            InviteStatus::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(InviteStatus::Active),
            "disabled" => Some(InviteStatus::Disabled),
            "pending" => Some(InviteStatus::Pending),
            _ => None,
        }
    }
}

/// An invite link into a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInvite {
    pub id: InviteId,
    /// Unique, immutable once issued.
    pub code: InviteCode,
    pub group_id: GroupId,
    pub created_by: UserId,
    pub created_by_role: MemberRole,
    pub status: InviteStatus,
    /// `None` means unlimited.
    pub max_uses: Option<u32>,
    pub uses_count: u32,
    pub expires_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl GroupInvite {
    /// Issues a new active invite.
    pub fn issue(
        group_id: GroupId,
        created_by: UserId,
        created_by_role: MemberRole,
        max_uses: Option<u32>,
        expires_at: Option<Timestamp>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: InviteId::new(),
            code: InviteCode::generate(),
            group_id,
            created_by,
            created_by_role,
            status: InviteStatus::Active,
            max_uses,
            uses_count: 0,
            expires_at,
            created_at: now,
        }
    }

    /// Runs the usability checks in order: status, expiry, usage cap.
    ///
    /// Existence is checked by the caller, so `NOT_FOUND` never comes from here.
    pub fn check_usable(&self, now: Timestamp) -> Result<(), InviteError> {
        if self.status != InviteStatus::Active {
            return Err(InviteError::Disabled);
        }
        if let Some(expires_at) = self.expires_at {
            if now.is_after(&expires_at) {
                return Err(InviteError::Expired);
            }
        }
        if let Some(max) = self.max_uses {
            if self.uses_count >= max {
                return Err(InviteError::MaxUses);
            }
        }
        Ok(())
    }

    /// Whether another use may be recorded without exceeding `max_uses`.
    pub fn has_remaining_uses(&self) -> bool {
        self.max_uses.map_or(true, |max| self.uses_count < max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite() -> GroupInvite {
        GroupInvite::issue(
            GroupId::new(),
            UserId::new(),
            MemberRole::Owner,
            None,
            None,
            Timestamp::now(),
        )
    }

    #[test]
    fn fresh_invite_is_usable() {
        assert_eq!(invite().check_usable(Timestamp::now()), Ok(()));
    }

    #[test]
    fn disabled_invite_fails_with_disabled() {
        let mut inv = invite();
        inv.status = InviteStatus::Disabled;
        assert_eq!(inv.check_usable(Timestamp::now()), Err(InviteError::Disabled));
    }

    #[test]
    fn pending_invite_is_not_usable() {
        let mut inv = invite();
        inv.status = InviteStatus::Pending;
        assert_eq!(inv.check_usable(Timestamp::now()), Err(InviteError::Disabled));
    }

    #[test]
    fn expired_invite_fails_with_expired() {
        let now = Timestamp::now();
        let mut inv = invite();
        inv.expires_at = Some(now.plus_minutes(-1));
        assert_eq!(inv.check_usable(now), Err(InviteError::Expired));
    }

    #[test]
    fn exhausted_invite_fails_with_max_uses() {
        let mut inv = invite();
        inv.max_uses = Some(2);
        inv.uses_count = 2;
        assert_eq!(inv.check_usable(Timestamp::now()), Err(InviteError::MaxUses));
        assert!(!inv.has_remaining_uses());
    }

    #[test]
    fn disabled_wins_over_expired_and_exhausted() {
        let now = Timestamp::now();
        let mut inv = invite();
        inv.status = InviteStatus::Disabled;
        inv.expires_at = Some(now.plus_minutes(-1));
        inv.max_uses = Some(1);
        inv.uses_count = 1;
        assert_eq!(inv.check_usable(now), Err(InviteError::Disabled));
    }

    #[test]
    fn expired_wins_over_exhausted() {
        let now = Timestamp::now();
        let mut inv = invite();
        inv.expires_at = Some(now.plus_minutes(-1));
        inv.max_uses = Some(1);
        inv.uses_count = 1;
        assert_eq!(inv.check_usable(now), Err(InviteError::Expired));
    }

    #[test]
    fn unlimited_invite_always_has_uses() {
        let mut inv = invite();
        inv.uses_count = 10_000;
        assert!(inv.has_remaining_uses());
    }
}
