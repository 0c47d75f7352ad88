//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the `config`
//! and `dotenvy` crates. Variables carry the `CAMPUS_MARKET` prefix and nested
//! values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use campus_market::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Backend at {}", config.backend.origin());
//! ```

mod auth;
mod backend;
mod environment;
mod error;
mod realtime;
mod telemetry;

pub use auth::AuthConfig;
pub use backend::BackendConfig;
pub use environment::Environment;
pub use error::{ConfigError, ValidationError};
pub use realtime::RealtimeConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Backend origin, key and schema
    pub backend: BackendConfig,

    /// Credential policy
    #[serde(default)]
    pub auth: AuthConfig,

    /// Realtime socket tuning
    #[serde(default)]
    pub realtime: RealtimeConfig,

    /// Logging
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Builds a configuration in code, with defaults for every optional section.
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            environment: Environment::default(),
            backend,
            auth: AuthConfig::default(),
            realtime: RealtimeConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `CAMPUS_MARKET` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CAMPUS_MARKET__BACKEND__URL=...` -> `backend.url = ...`
    /// - `CAMPUS_MARKET__REALTIME__HEARTBEAT_INTERVAL_SECS=30` -> `realtime.heartbeat_interval_secs = 30`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CAMPUS_MARKET")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Loads and validates in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.backend.validate(&self.environment)?;
        self.auth.validate()?;
        self.realtime.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}
