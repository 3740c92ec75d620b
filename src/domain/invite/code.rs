//! Invite code value object.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::InviteError;

/// Length of generated invite codes (hex characters).
const GENERATED_CODE_LEN: usize = 10;

/// A normalized (trimmed, uppercase) invite code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteCode(String);

impl InviteCode {
    /// Normalizes raw user input.
    ///
    /// Codes match case-insensitively, so the canonical form is uppercase.
    pub fn normalize(raw: &str) -> Result<Self, InviteError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(InviteError::MissingCode);
        }
        Ok(Self(normalized))
    }

    /// Generates a fresh random code of ten uppercase hex characters.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(hex[..GENERATED_CODE_LEN].to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
