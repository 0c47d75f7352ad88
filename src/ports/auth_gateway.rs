//! Auth gateway port.
//!
//! Wraps the hosted auth service: credential operations, the current session
//! and a broadcast stream of session changes.
//!
//! # Example
//!
//! ```ignore
//! let mut changes = gateway.subscribe();   // listen first
//! let initial = gateway.current_identity().await;
//! while let Ok(change) = changes.recv().await { /* ... */ }
//! ```

use async_trait::async_trait;
use secrecy::Secret;
use tokio::sync::broadcast;

use crate::domain::foundation::DataResult;
use crate::domain::session::{AuthChange, Identity};

/// Email and password pair.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password.into()),
        }
    }
}

/// Profile fields stored as account metadata at sign-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SignUpProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Hosted auth service.
///
/// # Contract
///
/// Implementations must:
/// - publish an `AuthChange` on `subscribe()` receivers for every session
///   change they cause or observe
/// - return `Ok(None)` from `current_identity` when nobody is signed in
/// - not retry
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Identity of the stored session, refreshing an expired access token first.
    async fn current_identity(&self) -> DataResult<Option<Identity>>;

    /// Receiver of every subsequent session change.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    /// Registers an account. `None` when the service waits for email confirmation.
    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &SignUpProfile,
    ) -> DataResult<Option<Identity>>;

    async fn sign_in(&self, credentials: &Credentials) -> DataResult<Identity>;

    async fn sign_out(&self) -> DataResult<()>;

    /// Sends a recovery email that links back to `redirect_to`.
    async fn reset_password(&self, email: &str, redirect_to: Option<&str>) -> DataResult<()>;

    async fn update_password(&self, password: &Secret<String>) -> DataResult<Identity>;

    async fn resend_verification(&self, email: &str) -> DataResult<()>;
}
