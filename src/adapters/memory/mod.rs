//! In-memory adapters.
//!
//! Scripted stand-ins for the hosted backend, used by tests and by the probe
//! binary when no backend is configured.

mod auth;
mod backend;
mod realtime;

pub use auth::MockAuthGateway;
pub use backend::InMemoryBackend;
pub use realtime::InMemoryRealtime;
