//! HTTP adapter for invites, joins and direct purchases.
//!
//! - `GET /api/invites/:code` - Preview the group behind an invite
//! - `POST /api/invites/:code/join` - Start a join (wallet, gateway or dev)
//! - `POST /api/invites/:code/join/confirm` - Confirm a dev join
//! - `POST /api/invites/:code/join/cancel` - Abandon a pending join
//! - `POST /api/admin/join-intents/:id/expire` - Expire a stale intent (operator)
//! - `POST /api/groups/:id/invites` - Issue an invite
//! - `POST /api/groups/:id/purchase` - Buy a seat directly

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::{admin_join_routes, group_routes, invite_routes};
