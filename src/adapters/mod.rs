//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `supabase` - the hosted REST, auth and realtime services
//! - `memory` - scripted in-memory stand-ins for tests and local runs

pub mod memory;
pub mod supabase;

pub use memory::{InMemoryBackend, InMemoryRealtime, MockAuthGateway};
pub use supabase::{Connection, GoTrueGateway, PhoenixRealtime, PostgrestBackend};
