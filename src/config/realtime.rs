//! Realtime socket configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Realtime socket configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds between Phoenix heartbeats
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,

    /// Capacity of each per-channel event queue
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl RealtimeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.heartbeat_interval_secs == 0 {
            return Err(ValidationError::InvalidHeartbeat);
        }
        if self.event_buffer == 0 {
            return Err(ValidationError::InvalidEventBuffer);
        }
        Ok(())
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    25
}

fn default_event_buffer() -> usize {
    256
}
