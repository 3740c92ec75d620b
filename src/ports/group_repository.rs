//! Group repository port.
//!
//! Seats bought through a payment are added by
//! `GroupTransactionRepository::commit_sale`, together with the sale.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, GroupId, UserId};
use crate::domain::group::{Group, GroupMembership};

/// Repository port for groups and memberships.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError>;

    /// Insert or replace a group row.
    async fn save(&self, group: &Group) -> Result<(), DomainError>;

    /// Insert a membership row as-is (owner seeding, moderators).
    ///
    /// # Errors
    ///
    /// - `AlreadyMember` if a non-left membership exists for (group, user)
    async fn save_membership(&self, membership: &GroupMembership) -> Result<(), DomainError>;

    /// The group's owner membership, if any.
    async fn find_owner(&self, group_id: &GroupId) -> Result<Option<GroupMembership>, DomainError>;

    /// The user's non-left membership in the group, if any.
    async fn find_current_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<GroupMembership>, DomainError>;

    /// Number of groups the user owns.
    async fn count_owned(&self, owner_id: &UserId) -> Result<u32, DomainError>;
}
