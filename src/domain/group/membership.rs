//! Group membership rows.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{GroupId, MembershipId, Timestamp, UserId};

/// Role of a member inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Moderator,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Moderator => "moderator",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(MemberRole::Owner),
            "moderator" => Some(MemberRole::Moderator),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

/// Whether a membership still counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Left,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Left => "left",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(MemberStatus::Active),
            "left" => Some(MemberStatus::Left),
            _ => None,
        }
    }
}

/// A user's seat in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: MembershipId,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: Timestamp,
}

impl GroupMembership {
    /// A paying (or free) member seat.
    pub fn member(group_id: GroupId, user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            id: MembershipId::new(),
            group_id,
            user_id,
            role: MemberRole::Member,
            status: MemberStatus::Active,
            joined_at,
        }
    }

    /// The owner's membership, created with the group.
    pub fn owner(group_id: GroupId, user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            role: MemberRole::Owner,
            ..Self::member(group_id, user_id, joined_at)
        }
    }

    /// True unless the member has left.
    pub fn is_current(&self) -> bool {
        self.status != MemberStatus::Left
    }

    pub fn is_owner(&self) -> bool {
        self.role == MemberRole::Owner
    }
}
