//! Strongly-typed identifier value objects.
//!
//! Auth subjects are UUIDs issued by the auth service. Every table row is
//! keyed by a database-assigned integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Identifier of an authenticated account (the `sub` claim of the access token).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parses a UserId, rejecting anything that is not a UUID.
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|e| ValidationError::invalid_format("user_id", e.to_string()))
    }

    /// Creates a UserId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Creates a random UserId, useful for fixtures.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn value(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

integer_id!(
    /// Row key of `User_Information`.
    ProfileId
);
integer_id!(
    /// Row key of `Product_Information`.
    ProductId
);
integer_id!(ChatId);
integer_id!(MessageId);
integer_id!(
    /// Row key of `Category_Tags`.
    CategoryId
);
integer_id!(
    /// Row key of `Shopping_Cart`.
    CartId
);
integer_id!(ReviewId);
integer_id!(ReportId);
integer_id!(
    /// Row key of `User_Interactions`.
    InteractionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parses_uuid() {
        let id = UserId::new("7b0e3c2a-4d1f-4c8e-9a55-1f2e3d4c5b6a").unwrap();
        assert_eq!(id.to_string(), "7b0e3c2a-4d1f-4c8e-9a55-1f2e3d4c5b6a");
    }

    #[test]
    fn user_id_rejects_garbage() {
        let result = UserId::new("not-a-uuid");
        assert!(matches!(result, Err(ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn user_id_serializes_as_plain_string() {
        let id = UserId::new("7b0e3c2a-4d1f-4c8e-9a55-1f2e3d4c5b6a").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"7b0e3c2a-4d1f-4c8e-9a55-1f2e3d4c5b6a\"");
    }

    #[test]
    fn integer_ids_serialize_transparently() {
        assert_eq!(serde_json::to_string(&ProductId::new(42)).unwrap(), "42");
        let chat: ChatId = serde_json::from_str("7").unwrap();
        assert_eq!(chat, ChatId::new(7));
    }

    #[test]
    fn integer_ids_display_their_value() {
        assert_eq!(CategoryId::new(3).to_string(), "3");
        assert_eq!(ReportId::from(11).value(), 11);
    }
}
