//! Mock auth gateway for tests and local runs.
//!
//! Holds accounts in memory, records every call by name and lets tests push
//! session changes and hold the initial session fetch open.
//!
//! # Example
//!
//! ```ignore
//! let gateway = MockAuthGateway::new()
//!     .with_account("a@mtroyal.ca", "secret", identity.clone());
//!
//! let release = gateway.hold_current_identity();
//! // ... start the synchronizer, emit changes ...
//! release.send(()).ok();
//! ```

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use tokio::sync::{broadcast, oneshot};

use crate::domain::foundation::{BackendError, DataError, DataResult, UserId};
use crate::domain::session::{AuthChange, Identity};
use crate::ports::{AuthGateway, Credentials, SignUpProfile};

/// In-memory auth gateway.
pub struct MockAuthGateway {
    accounts: RwLock<HashMap<String, (String, Identity)>>,
    session: RwLock<Option<Identity>>,
    fetch_error: RwLock<Option<DataError>>,
    fetch_gate: Mutex<Option<oneshot::Receiver<()>>>,
    changes: broadcast::Sender<AuthChange>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockAuthGateway {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            fetch_error: RwLock::new(None),
            fetch_gate: Mutex::new(None),
            changes,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Registers an account that `sign_in` accepts.
    pub fn with_account(self, email: &str, password: &str, identity: Identity) -> Self {
        self.accounts
            .write()
            .unwrap()
            .insert(email.to_ascii_lowercase(), (password.to_string(), identity));
        self
    }

    /// Starts with `identity` already signed in.
    pub fn with_session(self, identity: Identity) -> Self {
        *self.session.write().unwrap() = Some(identity);
        self
    }

    /// Makes `current_identity` fail.
    pub fn with_fetch_error(self, error: DataError) -> Self {
        *self.fetch_error.write().unwrap() = Some(error);
        self
    }

    /// Holds the next `current_identity` call until the returned sender fires or drops.
    pub fn hold_current_identity(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.fetch_gate.lock().unwrap() = Some(gate);
        release
    }

    /// Publishes a change as if the service pushed it.
    pub fn emit(&self, change: AuthChange) {
        *self.session.write().unwrap() = change.identity().cloned();
        let _ = self.changes.send(change);
    }

    // === Test Helpers ===

    /// Names of gateway operations called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Default for MockAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthGateway for MockAuthGateway {
    async fn current_identity(&self) -> DataResult<Option<Identity>> {
        self.record("current_identity");
        // Snapshot before waiting: a held fetch answers with what it would have seen when issued.
        let snapshot = self.session.read().unwrap().clone();
        let error = self.fetch_error.read().unwrap().clone();
        let gate = self.fetch_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match error {
            Some(error) => Err(error),
            None => Ok(snapshot),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        _profile: &SignUpProfile,
    ) -> DataResult<Option<Identity>> {
        self.record("sign_up");
        let email = credentials.email.to_ascii_lowercase();
        let mut accounts = self.accounts.write().unwrap();
        if accounts.contains_key(&email) {
            return Err(BackendError::new(422, "User already registered").into());
        }
        let identity = Identity::new(UserId::random(), email.clone());
        accounts.insert(
            email,
            (credentials.password.expose_secret().clone(), identity),
        );
        // Confirmation email pending: no session yet.
        Ok(None)
    }

    async fn sign_in(&self, credentials: &Credentials) -> DataResult<Identity> {
        self.record("sign_in");
        let account = self
            .accounts
            .read()
            .unwrap()
            .get(&credentials.email.to_ascii_lowercase())
            .cloned();
        match account {
            Some((password, identity)) if &password == credentials.password.expose_secret() => {
                self.emit(AuthChange::SignedIn(identity.clone()));
                Ok(identity)
            }
            _ => Err(BackendError::new(400, "Invalid login credentials")
                .with_code("invalid_credentials")
                .into()),
        }
    }

    async fn sign_out(&self) -> DataResult<()> {
        self.record("sign_out");
        self.emit(AuthChange::SignedOut);
        Ok(())
    }

    async fn reset_password(&self, _email: &str, _redirect_to: Option<&str>) -> DataResult<()> {
        self.record("reset_password");
        Ok(())
    }

    async fn update_password(&self, password: &Secret<String>) -> DataResult<Identity> {
        self.record("update_password");
        let identity = self
            .session
            .read()
            .unwrap()
            .clone()
            .ok_or_else(|| DataError::from(BackendError::new(401, "Auth session missing")))?;
        for (stored, account) in self.accounts.write().unwrap().values_mut() {
            if account.user_id == identity.user_id {
                *stored = password.expose_secret().clone();
            }
        }
        self.emit(AuthChange::UserUpdated(identity.clone()));
        Ok(identity)
    }

    async fn resend_verification(&self, _email: &str) -> DataResult<()> {
        self.record("resend_verification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new(UserId::random(), "a@mtroyal.ca")
    }

    #[tokio::test]
    async fn sign_in_with_known_account_emits_signed_in() {
        let who = identity();
        let gateway = MockAuthGateway::new().with_account("a@mtroyal.ca", "pw", who.clone());
        let mut changes = gateway.subscribe();

        let result = gateway.sign_in(&Credentials::new("a@mtroyal.ca", "pw")).await;

        assert_eq!(result, Ok(who.clone()));
        assert_eq!(changes.recv().await.unwrap(), AuthChange::SignedIn(who));
    }

    #[tokio::test]
    async fn wrong_password_is_backend_error() {
        let gateway = MockAuthGateway::new().with_account("a@mtroyal.ca", "pw", identity());
        let result = gateway.sign_in(&Credentials::new("a@mtroyal.ca", "nope")).await;
        assert!(result.unwrap_err().is_backend());
    }

    #[tokio::test]
    async fn current_identity_reflects_session() {
        let who = identity();
        let gateway = MockAuthGateway::new().with_session(who.clone());
        assert_eq!(gateway.current_identity().await, Ok(Some(who)));
        assert_eq!(gateway.calls(), vec!["current_identity"]);
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let gateway = MockAuthGateway::new();
        let credentials = Credentials::new("new@mtroyal.ca", "pw");
        let profile = SignUpProfile::default();

        assert_eq!(gateway.sign_up(&credentials, &profile).await, Ok(None));
        assert!(gateway.sign_up(&credentials, &profile).await.is_err());
    }
}
