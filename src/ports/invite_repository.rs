//! Invite repository port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::invite::{GroupInvite, InviteCode};

#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Looks up an invite by its normalized code.
    async fn find_by_code(&self, code: &InviteCode) -> Result<Option<GroupInvite>, DomainError>;

    /// Insert a new invite.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the code is already taken
    async fn save(&self, invite: &GroupInvite) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn InviteRepository) {}
    }
}
