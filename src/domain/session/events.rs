//! Auth session change events.
//!
//! Pushed by the auth gateway whenever the signed-in account changes:
//! - `SignedIn` - credentials accepted or a stored session restored
//! - `SignedOut` - session revoked locally or by the server
//! - `TokenRefreshed` - access token rotated for the same account
//! - `UserUpdated` - account attributes changed (e.g. password)

use serde::{Deserialize, Serialize};

use crate::domain::foundation::UserId;

// ════════════════════════════════════════════════════════════════════════════
// Identity
// ════════════════════════════════════════════════════════════════════════════

/// The account behind a session, read from the access token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Auth subject (`sub` claim).
    pub user_id: UserId,

    /// Email the account signed up with.
    pub email: String,

    /// Whether the email address has been confirmed.
    #[serde(default)]
    pub email_confirmed: bool,
}

impl Identity {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            email_confirmed: false,
        }
    }

    pub fn confirmed(mut self) -> Self {
        self.email_confirmed = true;
        self
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AuthChange
// ════════════════════════════════════════════════════════════════════════════

/// A session change pushed by the auth gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChange {
    SignedIn(Identity),
    SignedOut,
    TokenRefreshed(Identity),
    UserUpdated(Identity),
}

impl AuthChange {
    /// Identity after the change, `None` once signed out.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthChange::SignedIn(identity)
            | AuthChange::TokenRefreshed(identity)
            | AuthChange::UserUpdated(identity) => Some(identity),
            AuthChange::SignedOut => None,
        }
    }

    /// Event name as the auth service reports it.
    pub fn event_name(&self) -> &'static str {
        match self {
            AuthChange::SignedIn(_) => "SIGNED_IN",
            AuthChange::SignedOut => "SIGNED_OUT",
            AuthChange::TokenRefreshed(_) => "TOKEN_REFRESHED",
            AuthChange::UserUpdated(_) => "USER_UPDATED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_out_carries_no_identity() {
        assert!(AuthChange::SignedOut.identity().is_none());
    }

    #[test]
    fn refresh_keeps_identity() {
        let identity = Identity::new(UserId::random(), "a@mtroyal.ca");
        let change = AuthChange::TokenRefreshed(identity.clone());
        assert_eq!(change.identity(), Some(&identity));
        assert_eq!(change.event_name(), "TOKEN_REFRESHED");
    }
}
