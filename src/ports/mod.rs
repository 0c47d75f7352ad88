//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between the
//! application and the hosted backend. Adapters implement these ports.
//!
//! - `Backend` - table queries (REST)
//! - `RealtimeTransport` - channel join/leave and insert delivery
//! - `AuthGateway` - credentials, current session and session changes

mod auth_gateway;
mod backend;
mod realtime_transport;

pub use auth_gateway::{AuthGateway, Credentials, SignUpProfile};
pub use backend::Backend;
pub use realtime_transport::RealtimeTransport;
