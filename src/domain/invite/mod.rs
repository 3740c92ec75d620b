//! Invite domain module.
//!
//! Invite codes are normalized to uppercase and validated in a fixed order:
//! existence, status, expiry, usage cap.

mod aggregate;
mod code;
mod errors;

pub use aggregate::{GroupInvite, InviteStatus};
pub use code::InviteCode;
pub use errors::InviteError;
