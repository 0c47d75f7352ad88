//! Channel naming and join specification.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::domain::foundation::{ChatId, UserId};

/// What a realtime channel is scoped to.
///
/// Every scope kind has its own prefix, so names never collide across kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelScope {
    /// Messages posted in one chat.
    Chat(ChatId),
    /// Chats opened with one user.
    UserChats(UserId),
}

impl ChannelScope {
    pub fn channel_name(&self) -> ChannelName {
        match self {
            ChannelScope::Chat(id) => ChannelName(format!("chat-{}", id)),
            ChannelScope::UserChats(user) => ChannelName(format!("user-chats-{}", user)),
        }
    }
}

/// Deterministic channel name derived from a scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ChannelName(String);

impl ChannelName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Phoenix topic of the channel.
    pub fn topic(&self) -> String {
        format!("realtime:{}", self.0)
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `postgres_changes` listener registered on join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeBinding {
    pub event: &'static str,
    pub schema: String,
    pub table: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Everything a transport needs to join a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: ChannelName,
    pub bindings: Vec<ChangeBinding>,
}

/// A row inserted in a table a channel listens to.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertEvent {
    pub table: String,
    pub record: Value,
    pub commit_timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_scope_name() {
        let name = ChannelScope::Chat(ChatId::new(42)).channel_name();
        assert_eq!(name.as_str(), "chat-42");
        assert_eq!(name.topic(), "realtime:chat-42");
    }

    #[test]
    fn user_scope_name_uses_uuid() {
        let user = UserId::new("7b0e3c2a-4d1f-4c8e-9a55-1f2e3d4c5b6a").unwrap();
        let name = ChannelScope::UserChats(user).channel_name();
        assert_eq!(name.as_str(), "user-chats-7b0e3c2a-4d1f-4c8e-9a55-1f2e3d4c5b6a");
    }

    #[test]
    fn scope_kinds_do_not_collide() {
        let chat = ChannelScope::Chat(ChatId::new(1)).channel_name();
        let user = ChannelScope::UserChats(UserId::random()).channel_name();
        assert_ne!(chat, user);
    }

    #[test]
    fn binding_omits_absent_filter() {
        let binding = ChangeBinding {
            event: "INSERT",
            schema: "mru_dev".to_string(),
            table: "Messages",
            filter: None,
        };
        let json = serde_json::to_value(&binding).unwrap();
        assert!(json.get("filter").is_none());
    }
}
