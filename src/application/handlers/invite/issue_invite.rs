//! IssueInviteHandler - Command handler for creating a shareable invite code.

use std::sync::Arc;

use crate::domain::foundation::{ErrorCode, GroupId, Timestamp, UserId};
use crate::domain::group::GroupStatus;
use crate::domain::invite::GroupInvite;
use crate::domain::join::JoinError;
use crate::ports::{GroupRepository, InviteRepository, PlatformSettingsSource};

/// Attempts before giving up on a colliding generated code.
const MAX_CODE_ATTEMPTS: usize = 3;

/// Command to issue an invite for a group.
#[derive(Debug, Clone)]
pub struct IssueInviteCommand {
    pub group_id: GroupId,
    pub user_id: UserId,
    /// `None` means unlimited.
    pub max_uses: Option<u32>,
    /// Overrides the configured invite lifetime.
    pub expires_in_minutes: Option<u32>,
}

/// Result of issuing an invite.
#[derive(Debug, Clone)]
pub struct IssueInviteResult {
    pub invite: GroupInvite,
}

/// Handler for issuing invites.
pub struct IssueInviteHandler {
    groups: Arc<dyn GroupRepository>,
    invites: Arc<dyn InviteRepository>,
    settings: Arc<dyn PlatformSettingsSource>,
}

impl IssueInviteHandler {
    pub fn new(
        groups: Arc<dyn GroupRepository>,
        invites: Arc<dyn InviteRepository>,
        settings: Arc<dyn PlatformSettingsSource>,
    ) -> Self {
        Self {
            groups,
            invites,
            settings,
        }
    }

    pub async fn handle(&self, cmd: IssueInviteCommand) -> Result<IssueInviteResult, JoinError> {
        if cmd.max_uses == Some(0) {
            return Err(JoinError::validation("max_uses", "must be at least 1"));
        }

        let group = self
            .groups
            .find_by_id(&cmd.group_id)
            .await?
            .ok_or(JoinError::GroupNotFound(cmd.group_id))?;
        if group.status == GroupStatus::Archived {
            return Err(JoinError::GroupArchived);
        }

        let membership = self
            .groups
            .find_current_membership(&cmd.group_id, &cmd.user_id)
            .await?
            .ok_or(JoinError::Forbidden)?;
        if !membership.is_owner() && !group.allow_member_invites {
            return Err(JoinError::Forbidden);
        }

        let settings = self.settings.current().await?;
        let now = Timestamp::now();
        let ttl = cmd.expires_in_minutes.unwrap_or(settings.invite_ttl_minutes);
        let expires_at = Some(now.plus_minutes(i64::from(ttl)));

        for _ in 0..MAX_CODE_ATTEMPTS {
            let invite = GroupInvite::issue(
                cmd.group_id,
                cmd.user_id,
                membership.role,
                cmd.max_uses,
                expires_at,
                now,
            );
            match self.invites.save(&invite).await {
                Ok(()) => {
                    tracing::info!(
                        group_id = %cmd.group_id,
                        invite_code = %invite.code.as_str(),
                        max_uses = ?invite.max_uses,
                        "Invite issued"
                    );
                    return Ok(IssueInviteResult { invite });
                }
                Err(e) if e.code == ErrorCode::Conflict => {
                    tracing::debug!("Generated invite code collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(JoinError::Conflict("could not generate a unique invite code".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::fixtures::World;
    use crate::domain::group::GroupMembership;

    fn handler(world: &World) -> IssueInviteHandler {
        IssueInviteHandler::new(world.store.clone(), world.store.clone(), world.settings.clone())
    }

    fn cmd(group_id: GroupId, user_id: UserId) -> IssueInviteCommand {
        IssueInviteCommand {
            group_id,
            user_id,
            max_uses: Some(3),
            expires_in_minutes: None,
        }
    }

    #[tokio::test]
    async fn owner_issues_invite_with_configured_ttl() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);

        let result = handler(&world).handle(cmd(group.id, owner)).await.unwrap();
        let invite = result.invite;

        assert_eq!(invite.code.as_str().len(), 10);
        assert_eq!(invite.max_uses, Some(3));
        let expires_at = invite.expires_at.unwrap();
        assert!(expires_at.is_after(&invite.created_at.plus_minutes(59)));
        assert!(!expires_at.is_after(&invite.created_at.plus_minutes(60)));
        assert!(world.store.invite(&invite.id).is_some());
    }

    #[tokio::test]
    async fn plain_member_needs_member_invites_enabled() {
        let world = World::new();
        let owner = UserId::new();
        let mut group = world.group(owner, 20_000, 4);
        let member = UserId::new();
        world
            .store
            .save_membership(&GroupMembership::member(group.id, member, Timestamp::now()))
            .await
            .unwrap();

        let err = handler(&world).handle(cmd(group.id, member)).await.unwrap_err();
        assert_eq!(err, JoinError::Forbidden);

        group.allow_member_invites = true;
        GroupRepository::save(&*world.store, &group).await.unwrap();
        assert!(handler(&world).handle(cmd(group.id, member)).await.is_ok());
    }

    #[tokio::test]
    async fn outsiders_cannot_issue() {
        let world = World::new();
        let group = world.group(UserId::new(), 20_000, 4);

        let err = handler(&world).handle(cmd(group.id, UserId::new())).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn zero_max_uses_is_rejected() {
        let world = World::new();
        let owner = UserId::new();
        let group = world.group(owner, 20_000, 4);

        let err = handler(&world)
            .handle(IssueInviteCommand {
                max_uses: Some(0),
                ..cmd(group.id, owner)
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }
}
