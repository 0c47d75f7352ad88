//! Shared connection state for the hosted backend.
//!
//! One `Connection` is created per process and cloned into every adapter.
//! It owns the HTTP client and the current session tokens; the auth adapter
//! writes the tokens, everything else only reads them.

use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, Secret};
use std::sync::{Arc, RwLock};

use crate::config::BackendConfig;
use crate::domain::foundation::{BackendError, DataResult};
use crate::domain::session::Identity;

/// Tokens of the signed-in session.
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub access_token: Secret<String>,
    pub refresh_token: Secret<String>,
    /// Unix seconds after which the access token is rejected.
    pub expires_at: i64,
    pub identity: Identity,
}

impl StoredSession {
    /// True if the access token expires within `leeway_secs`.
    pub fn expires_within(&self, now: i64, leeway_secs: i64) -> bool {
        self.expires_at - leeway_secs <= now
    }
}

/// Cheap-to-clone handle on the HTTP client, origin and session tokens.
#[derive(Clone)]
pub struct Connection {
    client: Client,
    origin: String,
    anon_key: Secret<String>,
    schema: String,
    session: Arc<RwLock<Option<StoredSession>>>,
}

impl Connection {
    pub fn new(config: &BackendConfig) -> DataResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| BackendError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            origin: config.origin().to_string(),
            anon_key: config.anon_key.clone(),
            schema: config.schema.clone(),
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }

    /// Absolute URL for a path below the origin.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.origin, path)
    }

    /// Bearer token for requests: the session access token, or the anon key when signed out.
    pub fn bearer(&self) -> String {
        self.session()
            .map(|s| s.access_token.expose_secret().clone())
            .unwrap_or_else(|| self.anon_key().to_string())
    }

    /// Adds the `apikey` and `Authorization` headers.
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.anon_key())
            .bearer_auth(self.bearer())
    }

    pub fn session(&self) -> Option<StoredSession> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn store_session(&self, session: Option<StoredSession>) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    fn connection() -> Connection {
        Connection::new(&BackendConfig::new("https://demo.supabase.co/", "anon")).unwrap()
    }

    #[test]
    fn url_joins_origin_without_double_slash() {
        assert_eq!(
            connection().url("/rest/v1/Chats"),
            "https://demo.supabase.co/rest/v1/Chats"
        );
    }

    #[test]
    fn bearer_falls_back_to_anon_key() {
        let connection = connection();
        assert_eq!(connection.bearer(), "anon");

        connection.store_session(Some(StoredSession {
            access_token: Secret::new("jwt".to_string()),
            refresh_token: Secret::new("refresh".to_string()),
            expires_at: 0,
            identity: Identity::new(UserId::random(), "a@mtroyal.ca"),
        }));
        assert_eq!(connection.bearer(), "jwt");

        connection.store_session(None);
        assert_eq!(connection.bearer(), "anon");
    }

    #[test]
    fn clones_share_session() {
        let first = connection();
        let second = first.clone();
        second.store_session(Some(StoredSession {
            access_token: Secret::new("jwt".to_string()),
            refresh_token: Secret::new("refresh".to_string()),
            expires_at: 100,
            identity: Identity::new(UserId::random(), "a@mtroyal.ca"),
        }));
        assert!(first.session().is_some());
        assert!(first.session().unwrap().expires_within(95, 10));
    }
}
