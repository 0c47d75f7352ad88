//! Phoenix Realtime - Implementation of `RealtimeTransport` over the hosted
//! realtime socket.
//!
//! One WebSocket is shared by every channel. Public methods send commands to
//! a background task that owns the socket:
//!
//! ```text
//! join  ──► Command::Join  ──► phx_join ──► phx_reply(ok)   ──► ack
//! leave ──► Command::Leave ──► phx_leave
//! postgres_changes(INSERT) ──► channel sink
//! every heartbeat interval  ──► heartbeat
//! ```
//!
//! The socket is not reconnected. Once it closes every pending join fails
//! and later joins are rejected.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;

use super::connection::Connection;
use crate::config::RealtimeConfig;
use crate::domain::foundation::{BackendError, DataError, DataResult, ValidationError};
use crate::domain::realtime::{ChannelName, ChannelSpec, InsertEvent, INSERT};
use crate::ports::RealtimeTransport;

const PHOENIX_TOPIC: &str = "phoenix";

/// Phoenix v1 JSON frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Frame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(rename = "ref", default)]
    reference: Option<String>,
}

enum Command {
    Join {
        spec: ChannelSpec,
        sink: mpsc::Sender<InsertEvent>,
        ack: oneshot::Sender<DataResult<()>>,
    },
    Leave {
        name: ChannelName,
        ack: oneshot::Sender<()>,
    },
}

/// Socket URL for an HTTP(S) origin.
fn websocket_url(origin: &str, anon_key: &str) -> String {
    let socket_origin = if let Some(rest) = origin.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = origin.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        origin.to_string()
    };
    format!(
        "{}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
        socket_origin, anon_key
    )
}

fn closed() -> DataError {
    BackendError::transport("realtime socket closed").into()
}

// ════════════════════════════════════════════════════════════════════════════
// Channel bookkeeping
// ════════════════════════════════════════════════════════════════════════════

struct PendingJoin {
    topic: String,
    ack: oneshot::Sender<DataResult<()>>,
}

/// Socket-independent channel state owned by the driver task.
#[derive(Default)]
struct Channels {
    next_ref: u64,
    pending: HashMap<String, PendingJoin>,
    sinks: HashMap<String, mpsc::Sender<InsertEvent>>,
}

impl Channels {
    fn next_ref(&mut self) -> String {
        self.next_ref += 1;
        self.next_ref.to_string()
    }

    fn heartbeat(&mut self) -> Frame {
        Frame {
            topic: PHOENIX_TOPIC.to_string(),
            event: "heartbeat".to_string(),
            payload: json!({}),
            reference: Some(self.next_ref()),
        }
    }

    /// Applies a command, returning the frame to send, if any.
    fn command(&mut self, command: Command, access_token: &str) -> Option<Frame> {
        match command {
            Command::Join { spec, sink, ack } => {
                let topic = spec.name.topic();
                if self.sinks.contains_key(&topic) {
                    let _ = ack.send(Err(ValidationError::ChannelInUse {
                        channel: spec.name.to_string(),
                    }
                    .into()));
                    return None;
                }
                let reference = self.next_ref();
                self.sinks.insert(topic.clone(), sink);
                self.pending.insert(
                    reference.clone(),
                    PendingJoin {
                        topic: topic.clone(),
                        ack,
                    },
                );
                Some(Frame {
                    topic,
                    event: "phx_join".to_string(),
                    payload: json!({
                        "config": {
                            "broadcast": { "self": false },
                            "presence": { "key": "" },
                            "postgres_changes": spec.bindings,
                        },
                        "access_token": access_token,
                    }),
                    reference: Some(reference),
                })
            }
            Command::Leave { name, ack } => {
                let topic = name.topic();
                let _ = ack.send(());
                self.pending.retain(|_, pending| pending.topic != topic);
                self.sinks.remove(&topic)?;
                Some(Frame {
                    topic,
                    event: "phx_leave".to_string(),
                    payload: json!({}),
                    reference: Some(self.next_ref()),
                })
            }
        }
    }

    /// Applies an incoming frame. Never waits on a channel sink: an insert
    /// for a full sink is dropped.
    fn incoming(&mut self, frame: Frame) {
        match frame.event.as_str() {
            "phx_reply" => {
                let Some(pending) = frame.reference.and_then(|r| self.pending.remove(&r)) else {
                    return;
                };
                if frame.payload["status"] == "ok" {
                    tracing::info!(topic = %pending.topic, "channel joined");
                    let _ = pending.ack.send(Ok(()));
                } else {
                    tracing::warn!(topic = %pending.topic, payload = %frame.payload, "channel join rejected");
                    self.sinks.remove(&pending.topic);
                    let _ = pending
                        .ack
                        .send(Err(DataError::protocol("channel join rejected", frame.payload)));
                }
            }
            "postgres_changes" => {
                let data = &frame.payload["data"];
                if data["type"] != INSERT {
                    return;
                }
                let event = InsertEvent {
                    table: data["table"].as_str().unwrap_or_default().to_string(),
                    record: data["record"].clone(),
                    commit_timestamp: data["commit_timestamp"].as_str().map(str::to_string),
                };
                let Some(sink) = self.sinks.get(&frame.topic) else {
                    return;
                };
                match sink.try_send(event) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(topic = %frame.topic, "channel consumer behind, dropping insert");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        self.sinks.remove(&frame.topic);
                    }
                }
            }
            "phx_error" | "phx_close" => {
                if self.sinks.remove(&frame.topic).is_some() {
                    tracing::warn!(topic = %frame.topic, event = %frame.event, "channel closed by server");
                }
            }
            _ => {}
        }
    }

    /// Fails every join still waiting for its reply.
    fn shutdown(&mut self) {
        for (_, pending) in self.pending.drain() {
            let _ = pending.ack.send(Err(closed()));
        }
        self.sinks.clear();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Transport
// ════════════════════════════════════════════════════════════════════════════

/// Realtime transport over one shared Phoenix socket.
pub struct PhoenixRealtime {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl PhoenixRealtime {
    /// Spawns the socket task. Must be called inside a tokio runtime.
    pub fn start(connection: Connection, config: &RealtimeConfig) -> Self {
        let (commands, receiver) = mpsc::channel(64);
        let heartbeat = config.heartbeat_interval();
        let task = tokio::spawn(drive(connection, heartbeat, receiver));
        Self { commands, task }
    }
}

impl Drop for PhoenixRealtime {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn drive(connection: Connection, heartbeat: Duration, mut commands: mpsc::Receiver<Command>) {
    let url = websocket_url(connection.origin(), connection.anon_key());
    let mut channels = Channels::default();

    let socket = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            tracing::warn!(error = %e, "realtime socket could not connect");
            while let Some(command) = commands.recv().await {
                if let Command::Join { ack, .. } = command {
                    let _ = ack.send(Err(BackendError::transport(e.to_string()).into()));
                }
            }
            return;
        }
    };
    tracing::info!("realtime socket connected");
    let (mut write, mut read) = socket.split();

    let mut ticker = tokio::time::interval(heartbeat);
    ticker.tick().await;

    loop {
        let outgoing = tokio::select! {
            command = commands.recv() => match command {
                Some(command) => channels.command(command, &connection.bearer()),
                None => break,
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<Frame>(&text) {
                        Ok(frame) => channels.incoming(frame),
                        Err(e) => tracing::warn!(error = %e, "undecodable realtime frame"),
                    }
                    None
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => None,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "realtime socket failed");
                    break;
                }
            },
            _ = ticker.tick() => Some(channels.heartbeat()),
        };

        if let Some(frame) = outgoing {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "unencodable realtime frame");
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(text)).await {
                tracing::warn!(error = %e, "realtime socket write failed");
                break;
            }
        }
    }

    tracing::info!("realtime socket closed");
    channels.shutdown();
}

#[async_trait]
impl RealtimeTransport for PhoenixRealtime {
    async fn join(&self, spec: ChannelSpec, sink: mpsc::Sender<InsertEvent>) -> DataResult<()> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(Command::Join { spec, sink, ack })
            .await
            .map_err(|_| closed())?;
        reply.await.map_err(|_| closed())?
    }

    async fn leave(&self, name: &ChannelName) -> DataResult<()> {
        let (ack, reply) = oneshot::channel();
        self.commands
            .send(Command::Leave {
                name: name.clone(),
                ack,
            })
            .await
            .map_err(|_| closed())?;
        reply.await.map_err(|_| closed())
    }
}
