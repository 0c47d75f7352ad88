//! Realtime transport port.
//!
//! Owns the socket and the set of joined channels. The dispatcher asks it to
//! join a channel and receives inserts through an mpsc sender it provides.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::foundation::DataResult;
use crate::domain::realtime::{ChannelName, ChannelSpec, InsertEvent};

/// Joins and leaves named realtime channels.
///
/// # Contract
///
/// - `join` resolves once the server acknowledged the join; inserts matching
///   any binding are then sent to `sink` in arrival order
/// - `leave` stops delivery to the sink and is a no-op for unknown channels
/// - a closed `sink` is treated as an implicit leave
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn join(&self, spec: ChannelSpec, sink: mpsc::Sender<InsertEvent>) -> DataResult<()>;

    async fn leave(&self, name: &ChannelName) -> DataResult<()>;
}
