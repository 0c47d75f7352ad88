//! Tracing subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TelemetryConfig;

/// Filter from `RUST_LOG` when set, else from the configured level.
fn filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Installs the global subscriber.
///
/// Returns false when one is already installed; the existing one stays.
pub fn init(config: &TelemetryConfig) -> bool {
    let builder = fmt().with_env_filter(filter(config)).with_target(true);
    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(error) = result {
        tracing::warn!(%error, "tracing init failed");
        return false;
    }
    true
}
