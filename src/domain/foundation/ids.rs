//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id! {
    /// Identifier of a marketplace user (issued by the external auth service).
    UserId
}

uuid_id! {
    /// Identifier of a subscription-sharing group.
    GroupId
}

uuid_id! {
    /// Identifier of a user's membership row in a group.
    MembershipId
}

uuid_id! {
    /// Identifier of a group invite.
    InviteId
}

uuid_id! {
    /// Identifier of a join intent.
    JoinIntentId
}

uuid_id! {
    /// Identifier of a group transaction (the canonical ledger row of a seat sale).
    TransactionId
}

uuid_id! {
    /// Identifier of a wallet account.
    WalletId
}

uuid_id! {
    /// Identifier of a single wallet transaction.
    WalletTransactionId
}

uuid_id! {
    /// Identifier of a withdrawal request.
    WithdrawalId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(GroupId::new(), GroupId::new());
    }

    #[test]
    fn id_round_trips_through_string() {
        let id = WithdrawalId::new();
        let parsed: WithdrawalId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("not-a-uuid".parse::<UserId>().is_err());
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = JoinIntentId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
