//! Invite resolution errors.
//!
//! Each failing check surfaces as its own kind because clients show a
//! different message for each.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | MissingCode | 400 |
//! | NotFound | 404 |
//! | Disabled | 410 |
//! | Expired | 410 |
//! | MaxUses | 410 |
//! | GroupNotFound | 404 |

use crate::domain::foundation::{DomainError, ErrorCode};

/// Why an invite code cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteError {
    MissingCode,
    NotFound,
    Disabled,
    Expired,
    MaxUses,
    GroupNotFound,
}

impl InviteError {
    pub fn code(&self) -> ErrorCode {
        match self {
            InviteError::MissingCode => ErrorCode::MissingCode,
            InviteError::NotFound => ErrorCode::InviteNotFound,
            InviteError::Disabled => ErrorCode::InviteDisabled,
            InviteError::Expired => ErrorCode::InviteExpired,
            InviteError::MaxUses => ErrorCode::InviteMaxUses,
            InviteError::GroupNotFound => ErrorCode::GroupNotFound,
        }
    }

    pub fn message(&self) -> String {
        match self {
            InviteError::MissingCode => "Invite code is required".to_string(),
            InviteError::NotFound => "Invalid invite code".to_string(),
            InviteError::Disabled => "Invite is no longer active".to_string(),
            InviteError::Expired => "Invite has expired, ask for a new link".to_string(),
            InviteError::MaxUses => "Invite has reached its usage limit".to_string(),
            InviteError::GroupNotFound => "Group for this invite no longer exists".to_string(),
        }
    }
}

impl std::fmt::Display for InviteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for InviteError {}

impl From<InviteError> for DomainError {
    fn from(err: InviteError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
