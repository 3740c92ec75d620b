use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, GroupId, UserId};
use crate::domain::group::{Group, GroupMembership};
use crate::ports::GroupRepository;

use super::InMemoryStore;

fn is_current_for(m: &GroupMembership, group_id: &GroupId, user_id: &UserId) -> bool {
    m.group_id == *group_id && m.user_id == *user_id && m.is_current()
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn find_by_id(&self, id: &GroupId) -> Result<Option<Group>, DomainError> {
        Ok(self.lock().groups.get(id).cloned())
    }

    async fn save(&self, group: &Group) -> Result<(), DomainError> {
        self.lock().groups.insert(group.id, group.clone());
        Ok(())
    }

    async fn save_membership(&self, membership: &GroupMembership) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state
            .memberships
            .iter()
            .any(|m| is_current_for(m, &membership.group_id, &membership.user_id))
        {
            return Err(DomainError::new(
                ErrorCode::AlreadyMember,
                "User already has a membership in this group",
            ));
        }
        state.memberships.push(membership.clone());
        Ok(())
    }

    async fn find_owner(&self, group_id: &GroupId) -> Result<Option<GroupMembership>, DomainError> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .find(|m| m.group_id == *group_id && m.is_owner() && m.is_current())
            .cloned())
    }

    async fn find_current_membership(
        &self,
        group_id: &GroupId,
        user_id: &UserId,
    ) -> Result<Option<GroupMembership>, DomainError> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .find(|m| is_current_for(m, group_id, user_id))
            .cloned())
    }

    async fn count_owned(&self, owner_id: &UserId) -> Result<u32, DomainError> {
        Ok(self
            .lock()
            .memberships
            .iter()
            .filter(|m| m.user_id == *owner_id && m.is_owner() && m.is_current())
            .count() as u32)
    }
}
