//! Backend connection configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::environment::Environment;
use super::error::ValidationError;

/// Connection settings for the hosted backend (REST, auth and realtime share one origin).
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// Project origin, e.g. `https://abc.supabase.co`
    pub url: String,

    /// Public anonymous API key sent with every request
    pub anon_key: Secret<String>,

    /// Database schema exposed through the REST API
    #[serde(default = "default_schema")]
    pub schema: String,

    /// TCP connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl BackendConfig {
    /// Creates a config with defaults for everything but the origin and key.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: Secret::new(anon_key.into()),
            schema: default_schema(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Origin without a trailing slash.
    pub fn origin(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Validate backend configuration
    ///
    /// In production the origin must be HTTPS.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("BACKEND__URL"));
        }
        if self.anon_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("BACKEND__ANON_KEY"));
        }
        if self.schema.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BACKEND__SCHEMA"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ValidationError::InvalidBackendUrl);
        }
        if environment.is_production() && !self.url.starts_with("https://") {
            return Err(ValidationError::BackendMustBeHttps);
        }
        if self.connect_timeout_secs == 0 || self.connect_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_schema() -> String {
    "mru_dev".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}
