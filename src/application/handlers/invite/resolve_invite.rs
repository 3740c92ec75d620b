//! ResolveInviteHandler - Query handler for looking up an invite link.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{GroupId, Money, Timestamp};
use crate::domain::group::{Group, GroupStatus};
use crate::domain::invite::{GroupInvite, InviteCode, InviteError};
use crate::domain::join::JoinError;
use crate::ports::{GroupRepository, InviteRepository, PlatformSettingsSource};

/// Query to resolve an invite code.
#[derive(Debug, Clone)]
pub struct ResolveInviteQuery {
    /// Raw code as typed or linked; normalized before lookup.
    pub code: String,
}

/// What a prospective member sees before paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveInviteResult {
    pub group_id: GroupId,
    pub name: String,
    pub status: GroupStatus,
    pub share_price: Money,
    pub share_limit: u32,
    pub member_count: u32,
    pub seats_left: u32,
    pub invite_code: String,
    pub expires_at: Option<Timestamp>,
    pub platform_fee_percent: u8,
}

/// Runs the invite checks in order and returns the invite with its group.
///
/// Shared by resolution and join initiation so both report the same kind.
pub(crate) async fn resolve_usable_invite(
    invites: &dyn InviteRepository,
    groups: &dyn GroupRepository,
    raw_code: &str,
    now: Timestamp,
) -> Result<(GroupInvite, Group), JoinError> {
    let code = InviteCode::normalize(raw_code)?;
    let invite = invites
        .find_by_code(&code)
        .await?
        .ok_or(InviteError::NotFound)?;
    invite.check_usable(now)?;

    let group = groups
        .find_by_id(&invite.group_id)
        .await?
        .ok_or(InviteError::GroupNotFound)?;

    Ok((invite, group))
}

/// Handler for resolving invites.
pub struct ResolveInviteHandler {
    invites: Arc<dyn InviteRepository>,
    groups: Arc<dyn GroupRepository>,
    settings: Arc<dyn PlatformSettingsSource>,
}

impl ResolveInviteHandler {
    pub fn new(
        invites: Arc<dyn InviteRepository>,
        groups: Arc<dyn GroupRepository>,
        settings: Arc<dyn PlatformSettingsSource>,
    ) -> Self {
        Self {
            invites,
            groups,
            settings,
        }
    }

    pub async fn handle(&self, query: ResolveInviteQuery) -> Result<ResolveInviteResult, JoinError> {
        let (invite, group) = resolve_usable_invite(
            self.invites.as_ref(),
            self.groups.as_ref(),
            &query.code,
            Timestamp::now(),
        )
        .await?;
        let settings = self.settings.current().await?;

        Ok(ResolveInviteResult {
            group_id: group.id,
            seats_left: group.seats_left(),
            name: group.name,
            status: group.status,
            share_price: group.share_price,
            share_limit: group.share_limit,
            member_count: group.member_count,
            invite_code: invite.code.as_str().to_string(),
            expires_at: invite.expires_at,
            platform_fee_percent: settings.platform_cut_percent.value(),
        })
    }
}
