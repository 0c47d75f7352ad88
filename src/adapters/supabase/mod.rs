//! Hosted backend adapters.
//!
//! - `PostgrestBackend` - table queries over REST
//! - `GoTrueGateway` - email/password auth and token refresh
//! - `PhoenixRealtime` - insert notifications over the realtime socket
//!
//! All three share one [`Connection`], which carries the session tokens.

mod connection;
mod gotrue;
mod postgrest;
mod realtime;

pub use connection::{Connection, StoredSession};
pub use gotrue::GoTrueGateway;
pub use postgrest::PostgrestBackend;
pub use realtime::PhoenixRealtime;
