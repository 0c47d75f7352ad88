//! Error types for the data-access layer.
//!
//! Every runtime failure is one of three kinds and travels back to the caller
//! as a value, never as a panic:
//!
//! - [`ValidationError`] - rejected locally before any backend call
//! - [`BackendError`] - the error envelope returned by the backend
//! - [`DataError::Protocol`] - a response that is neither success nor error,
//!   or whose payload does not match the requested shape

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Errors raised by builder setters and credential checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("Field '{field}' cannot be negative, got {actual}")]
    Negative { field: String, actual: f64 },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("Field '{field}' is required")]
    Missing { field: String },

    #[error("Email domain '{domain}' is not allowed, expected '{expected}'")]
    DisallowedDomain { domain: String, expected: String },

    #[error("Channel '{channel}' already has an open subscription")]
    ChannelInUse { channel: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i32, max: i32, actual: i32) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates a negative value validation error.
    pub fn negative(field: impl Into<String>, actual: f64) -> Self {
        ValidationError::Negative {
            field: field.into(),
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing field validation error.
    pub fn missing(field: impl Into<String>) -> Self {
        ValidationError::Missing { field: field.into() }
    }
}

/// Error envelope returned by the backend.
///
/// Mirrors the Postgrest/GoTrue error body. Unknown fields are ignored and
/// absent ones default, so any JSON object can be read as an envelope.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendError {
    #[serde(default, alias = "msg", alias = "error_description")]
    pub message: String,
    #[serde(default, deserialize_with = "code_as_string")]
    pub code: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    /// HTTP status of the response that carried the envelope (0 for transport failures).
    #[serde(default)]
    pub status: u16,
}

impl BackendError {
    /// Creates an envelope with only a message and status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
            ..Default::default()
        }
    }

    /// Creates an envelope for a request that never produced a response.
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some("transport".to_string()),
            ..Default::default()
        }
    }

    /// Attaches the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Returns true if the envelope describes a request that never reached the server.
    pub fn is_transport(&self) -> bool {
        self.code.as_deref() == Some("transport")
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for BackendError {}

// GoTrue sends numeric codes, Postgrest sends strings.
fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}

/// Outcome error of every data operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Backend error: {0}")]
    Backend(BackendError),

    #[error("Protocol error: {message}")]
    Protocol { message: String, context: Value },
}

impl DataError {
    /// Creates a protocol error with the offending payload as context.
    pub fn protocol(message: impl Into<String>, context: Value) -> Self {
        DataError::Protocol {
            message: message.into(),
            context,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, DataError::Validation(_))
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, DataError::Backend(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, DataError::Protocol { .. })
    }
}

impl From<BackendError> for DataError {
    fn from(error: BackendError) -> Self {
        DataError::Backend(error)
    }
}

/// Universal return shape of data operations.
pub type DataResult<T> = Result<T, DataError>;

/// Converts an absent value into a validation error naming the field.
pub fn present<T>(field: &str, value: Option<T>) -> DataResult<T> {
    value.ok_or_else(|| ValidationError::missing(field).into())
}
