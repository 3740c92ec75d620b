use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::invite::{GroupInvite, InviteCode};
use crate::ports::InviteRepository;

use super::InMemoryStore;

#[async_trait]
impl InviteRepository for InMemoryStore {
    async fn find_by_code(&self, code: &InviteCode) -> Result<Option<GroupInvite>, DomainError> {
        Ok(self
            .lock()
            .invites
            .values()
            .find(|i| i.code == *code)
            .cloned())
    }

    async fn save(&self, invite: &GroupInvite) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state
            .invites
            .values()
            .any(|i| i.code == invite.code && i.id != invite.id)
        {
            return Err(DomainError::new(ErrorCode::Conflict, "Invite code already exists"));
        }
        state.invites.insert(invite.id, invite.clone());
        Ok(())
    }
}
