//! GoTrue Gateway - Implementation of `AuthGateway` over the hosted auth API.
//!
//! Tokens are kept in the shared [`Connection`] so table queries and channel
//! joins run as the signed-in user. Access-token claims are read without
//! verifying the signature: the server verifies, the client only needs the
//! subject and expiry.
//!
//! # Session lifecycle
//!
//! ```text
//! sign_in ──► token?grant_type=password ──► store ──► SignedIn
//! current_identity (expired) ──► token?grant_type=refresh_token ──► TokenRefreshed
//! sign_out ──► logout ──► clear ──► SignedOut
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use super::connection::{Connection, StoredSession};
use super::postgrest::classify;
use crate::domain::foundation::{BackendError, DataError, DataResult, UserId};
use crate::domain::session::{AuthChange, Identity};
use crate::ports::{AuthGateway, Credentials, SignUpProfile};

/// Seconds before expiry at which the access token is refreshed.
const REFRESH_LEEWAY_SECS: i64 = 30;

#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: UserId,
    #[serde(default)]
    email: Option<String>,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
}

impl UserBody {
    fn identity(self) -> Identity {
        let identity = Identity::new(self.id, self.email.unwrap_or_default());
        if self.email_confirmed_at.is_some() {
            identity.confirmed()
        } else {
            identity
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<UserBody>,
}

/// Reads the claims of an access token without verifying its signature.
fn read_claims(token: &str) -> DataResult<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| DataError::protocol(format!("unreadable access token: {}", e), Value::Null))
}

fn stored_session(body: SessionBody) -> DataResult<StoredSession> {
    let claims = read_claims(&body.access_token)?;
    let identity = match body.user {
        Some(user) => user.identity(),
        None => Identity::new(claims.sub, claims.email.unwrap_or_default()),
    };
    Ok(StoredSession {
        access_token: Secret::new(body.access_token),
        refresh_token: Secret::new(body.refresh_token),
        expires_at: claims.exp,
        identity,
    })
}

fn decode_body<T: serde::de::DeserializeOwned>(value: Value) -> DataResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| {
        DataError::protocol(format!("unexpected auth response: {}", e), value)
    })
}

/// Auth gateway backed by the hosted GoTrue service.
pub struct GoTrueGateway {
    connection: Connection,
    changes: broadcast::Sender<AuthChange>,
}

impl GoTrueGateway {
    pub fn new(connection: Connection) -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            connection,
            changes,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        self.connection.url(&format!("/auth/v1/{}", path))
    }

    fn publish(&self, change: AuthChange) {
        tracing::debug!(event = change.event_name(), "auth change");
        // No receivers is fine: nobody is synchronizing yet.
        let _ = self.changes.send(change);
    }

    /// Sends a request and returns the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> DataResult<Value> {
        let response = self
            .connection
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::transport(e.to_string()))?;

        let raw = classify(status, &body);
        match raw.error {
            Some(error) => {
                tracing::warn!(status = error.status, error = %error, "auth request failed");
                Err(error.into())
            }
            None => Ok(raw.data.unwrap_or(Value::Null)),
        }
    }

    async fn token_grant(&self, grant: &str, body: Value) -> DataResult<StoredSession> {
        let request = self
            .connection
            .client()
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant)])
            .json(&body);
        let value = self.send(request).await?;
        stored_session(decode_body(value)?)
    }

    async fn refresh(&self, session: &StoredSession) -> DataResult<Identity> {
        let body = json!({ "refresh_token": session.refresh_token.expose_secret() });
        match self.token_grant("refresh_token", body).await {
            Ok(refreshed) => {
                let identity = refreshed.identity.clone();
                self.connection.store_session(Some(refreshed));
                self.publish(AuthChange::TokenRefreshed(identity.clone()));
                Ok(identity)
            }
            Err(error) => {
                self.connection.store_session(None);
                self.publish(AuthChange::SignedOut);
                Err(error)
            }
        }
    }
}

#[async_trait]
impl AuthGateway for GoTrueGateway {
    async fn current_identity(&self) -> DataResult<Option<Identity>> {
        let Some(session) = self.connection.session() else {
            return Ok(None);
        };
        let now = chrono::Utc::now().timestamp();
        if session.expires_within(now, REFRESH_LEEWAY_SECS) {
            return self.refresh(&session).await.map(Some);
        }
        Ok(Some(session.identity))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn sign_up(
        &self,
        credentials: &Credentials,
        profile: &SignUpProfile,
    ) -> DataResult<Option<Identity>> {
        let request = self.connection.client().post(self.endpoint("signup")).json(&json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
            "data": profile,
        }));
        let value = self.send(request).await?;

        // With email confirmation enabled the body is the bare user, without tokens.
        if value.get("access_token").is_none() {
            return Ok(None);
        }
        let session = stored_session(decode_body(value)?)?;
        let identity = session.identity.clone();
        self.connection.store_session(Some(session));
        self.publish(AuthChange::SignedIn(identity.clone()));
        Ok(Some(identity))
    }

    async fn sign_in(&self, credentials: &Credentials) -> DataResult<Identity> {
        let body = json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        });
        let session = self.token_grant("password", body).await?;
        let identity = session.identity.clone();
        self.connection.store_session(Some(session));
        self.publish(AuthChange::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> DataResult<()> {
        if self.connection.session().is_none() {
            return Ok(());
        }
        let request = self.connection.client().post(self.endpoint("logout"));
        let result = self.send(request).await;
        // The local session goes regardless; a revoked or expired token is still signed out.
        self.connection.store_session(None);
        self.publish(AuthChange::SignedOut);
        result.map(|_| ())
    }

    async fn reset_password(&self, email: &str, redirect_to: Option<&str>) -> DataResult<()> {
        let mut request = self
            .connection
            .client()
            .post(self.endpoint("recover"))
            .json(&json!({ "email": email }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        self.send(request).await.map(|_| ())
    }

    async fn update_password(&self, password: &Secret<String>) -> DataResult<Identity> {
        let Some(mut session) = self.connection.session() else {
            return Err(BackendError::new(401, "Auth session missing").into());
        };
        let request = self
            .connection
            .client()
            .put(self.endpoint("user"))
            .json(&json!({ "password": password.expose_secret() }));
        let user: UserBody = decode_body(self.send(request).await?)?;

        let identity = user.identity();
        session.identity = identity.clone();
        self.connection.store_session(Some(session));
        self.publish(AuthChange::UserUpdated(identity.clone()));
        Ok(identity)
    }

    async fn resend_verification(&self, email: &str) -> DataResult<()> {
        let request = self
            .connection
            .client()
            .post(self.endpoint("resend"))
            .json(&json!({ "type": "signup", "email": email }));
        self.send(request).await.map(|_| ())
    }
}
