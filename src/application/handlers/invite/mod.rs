//! Invite handlers.
//!
//! ## Queries
//! - Resolving an invite code to the group it admits to
//!
//! ## Commands
//! - Issuing a new invite code for a group

mod issue_invite;
mod resolve_invite;

pub use issue_invite::{IssueInviteCommand, IssueInviteHandler, IssueInviteResult};
pub use resolve_invite::{ResolveInviteHandler, ResolveInviteQuery, ResolveInviteResult};

pub(crate) use resolve_invite::resolve_usable_invite;
