//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Backend URL must start with http:// or https://")]
    InvalidBackendUrl,

    #[error("Backend URL must use HTTPS in production")]
    BackendMustBeHttps,

    #[error("Invalid connect timeout")]
    InvalidTimeout,

    #[error("Invalid institution domain: {0}")]
    InvalidInstitutionDomain(String),

    #[error("Heartbeat interval must be greater than zero")]
    InvalidHeartbeat,

    #[error("Realtime event buffer must be greater than zero")]
    InvalidEventBuffer,

    #[error("Invalid log filter: {0}")]
    InvalidLogLevel(String),
}
