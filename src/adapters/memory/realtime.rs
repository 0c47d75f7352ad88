//! In-memory realtime transport.
//!
//! Joined channels keep the sink they were given; tests push inserts with
//! [`InMemoryRealtime::emit`]. The join handshake can be held open to
//! exercise teardown before the server acknowledged the channel.
//!
//! # Panics
//!
//! Methods panic if internal locks are poisoned. Test and local use only.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};

use crate::domain::foundation::{DataError, DataResult};
use crate::domain::realtime::{ChannelName, ChannelSpec, InsertEvent};
use crate::ports::RealtimeTransport;

struct Joined {
    spec: ChannelSpec,
    sink: mpsc::Sender<InsertEvent>,
}

/// Realtime transport that keeps channels in a map.
pub struct InMemoryRealtime {
    channels: Mutex<HashMap<ChannelName, Joined>>,
    joins: Mutex<Vec<ChannelSpec>>,
    leaves: Mutex<Vec<ChannelName>>,
    join_error: Mutex<Option<DataError>>,
    handshake: watch::Sender<bool>,
}

impl InMemoryRealtime {
    /// Transport that acknowledges joins immediately.
    pub fn new() -> Self {
        let (handshake, _) = watch::channel(true);
        Self {
            channels: Mutex::new(HashMap::new()),
            joins: Mutex::new(Vec::new()),
            leaves: Mutex::new(Vec::new()),
            join_error: Mutex::new(None),
            handshake,
        }
    }

    /// Transport whose joins wait until [`release_handshakes`](Self::release_handshakes).
    pub fn with_pending_handshake() -> Self {
        let transport = Self::new();
        transport.handshake.send_replace(false);
        transport
    }

    /// Makes every subsequent join fail with `error`.
    pub fn with_join_error(self, error: DataError) -> Self {
        *self.join_error.lock().expect("error lock poisoned") = Some(error);
        self
    }

    pub fn release_handshakes(&self) {
        self.handshake.send_replace(true);
    }

    /// Delivers an insert on `channel`. Returns false if nothing is listening.
    pub async fn emit(&self, channel: &ChannelName, record: Value) -> bool {
        let target = {
            let channels = self.channels.lock().expect("channel lock poisoned");
            channels.get(channel).map(|joined| {
                let table = joined
                    .spec
                    .bindings
                    .first()
                    .map(|b| b.table.to_string())
                    .unwrap_or_default();
                (joined.sink.clone(), table)
            })
        };

        match target {
            Some((sink, table)) => {
                let event = InsertEvent {
                    table,
                    record,
                    commit_timestamp: None,
                };
                if sink.send(event).await.is_ok() {
                    true
                } else {
                    self.channels
                        .lock()
                        .expect("channel lock poisoned")
                        .remove(channel);
                    false
                }
            }
            None => false,
        }
    }

    // === Test Helpers ===

    pub fn is_joined(&self, channel: &ChannelName) -> bool {
        self.channels
            .lock()
            .expect("channel lock poisoned")
            .contains_key(channel)
    }

    /// Specs of every join attempt, in order.
    pub fn joins(&self) -> Vec<ChannelSpec> {
        self.joins.lock().expect("join lock poisoned").clone()
    }

    /// Names of every leave call, in order.
    pub fn leaves(&self) -> Vec<ChannelName> {
        self.leaves.lock().expect("leave lock poisoned").clone()
    }
}

impl Default for InMemoryRealtime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeTransport for InMemoryRealtime {
    async fn join(&self, spec: ChannelSpec, sink: mpsc::Sender<InsertEvent>) -> DataResult<()> {
        self.joins
            .lock()
            .expect("join lock poisoned")
            .push(spec.clone());

        let mut handshake = self.handshake.subscribe();
        // Sender lives as long as self, so this only fails if self is gone.
        let _ = handshake.wait_for(|open| *open).await;

        if let Some(error) = self.join_error.lock().expect("error lock poisoned").clone() {
            return Err(error);
        }

        self.channels
            .lock()
            .expect("channel lock poisoned")
            .insert(spec.name.clone(), Joined { spec, sink });
        Ok(())
    }

    async fn leave(&self, name: &ChannelName) -> DataResult<()> {
        self.leaves
            .lock()
            .expect("leave lock poisoned")
            .push(name.clone());
        self.channels
            .lock()
            .expect("channel lock poisoned")
            .remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ChatId;
    use crate::domain::realtime::{ChangeBinding, ChannelScope, INSERT};
    use serde_json::json;

    fn spec(name: ChannelName) -> ChannelSpec {
        ChannelSpec {
            name,
            bindings: vec![ChangeBinding {
                event: INSERT,
                schema: "mru_dev".to_string(),
                table: "Messages",
                filter: Some("chat_id=eq.1".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn emit_reaches_joined_sink() {
        let transport = InMemoryRealtime::new();
        let name = ChannelScope::Chat(ChatId::new(1)).channel_name();
        let (tx, mut rx) = mpsc::channel(4);

        transport.join(spec(name.clone()), tx).await.unwrap();
        assert!(transport.emit(&name, json!({ "id": 1 })).await);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, "Messages");
        assert_eq!(event.record, json!({ "id": 1 }));
    }

    #[tokio::test]
    async fn emit_after_leave_is_dropped() {
        let transport = InMemoryRealtime::new();
        let name = ChannelScope::Chat(ChatId::new(1)).channel_name();
        let (tx, _rx) = mpsc::channel(4);

        transport.join(spec(name.clone()), tx).await.unwrap();
        transport.leave(&name).await.unwrap();

        assert!(!transport.emit(&name, json!({ "id": 1 })).await);
        assert_eq!(transport.leaves(), vec![name]);
    }

    #[tokio::test]
    async fn failing_join_is_reported() {
        let transport = InMemoryRealtime::new()
            .with_join_error(DataError::protocol("channel rejected", Value::Null));
        let name = ChannelScope::Chat(ChatId::new(1)).channel_name();
        let (tx, _rx) = mpsc::channel(4);

        assert!(transport.join(spec(name.clone()), tx).await.is_err());
        assert!(!transport.is_joined(&name));
    }
}
