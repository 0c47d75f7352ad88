//! Messaging - chats between two users and the messages posted in them.

use crate::application::client::DataClient;
use crate::application::dispatcher::{SubscriptionDispatcher, SubscriptionHandle};
use crate::domain::foundation::{ChatId, DataResult, MessageId, UserId, ValidationError};
use crate::domain::query::Filter;
use crate::domain::realtime::{ChangeFilter, ChannelScope, RowFilter};
use crate::domain::schema::{
    Chat, ChatColumn, ChatPatch, Message, MessageColumn, MessagePatch,
};

crate::pick! {
    /// Id of a written message.
    pub struct MessageKey from Message {
        id: MessageId = MessageColumn::Id,
    }
}

crate::pick! {
    /// Id of a written chat.
    pub struct ChatKey from Chat {
        id: ChatId = ChatColumn::Id,
    }
}

/// Chats of a user.
#[derive(Clone)]
pub struct Chats {
    client: DataClient,
    dispatcher: SubscriptionDispatcher,
}

impl Chats {
    pub fn new(client: DataClient, dispatcher: SubscriptionDispatcher) -> Self {
        Self { client, dispatcher }
    }

    pub(crate) fn backlog(&self) -> usize {
        self.dispatcher.buffer()
    }

    pub async fn get(&self, id: ChatId) -> DataResult<Chat> {
        self.client
            .from::<Chat>()
            .select::<Chat>()
            .eq(ChatColumn::Id, id)
            .one()
            .await
    }

    /// Chats `user` takes part in, newest first.
    pub async fn for_user(&self, user: UserId) -> DataResult<Vec<Chat>> {
        self.client
            .from::<Chat>()
            .select::<Chat>()
            .or([
                Filter::eq(ChatColumn::UserId1, user),
                Filter::eq(ChatColumn::UserId2, user),
            ])
            .order(ChatColumn::CreatedAt, false)
            .many()
            .await
    }

    pub async fn set_visible(&self, id: ChatId, visible: bool) -> DataResult<ChatKey> {
        let patch = ChatPatch {
            visible: Some(visible),
            ..Default::default()
        };
        self.client
            .from::<Chat>()
            .update(&patch)?
            .eq(ChatColumn::Id, id)
            .returning::<ChatKey>()
            .one()
            .await
    }

    /// Opens a chat between two distinct users.
    pub async fn create(&self, a: UserId, b: UserId) -> DataResult<Chat> {
        if a == b {
            return Err(ValidationError::invalid_format("user_id_2", "cannot chat with yourself").into());
        }
        let patch = ChatPatch {
            user_id_1: Some(a),
            user_id_2: Some(b),
            ..Default::default()
        };
        self.client.from::<Chat>().insert(&patch)?.one().await
    }

    /// Calls `on_insert` for every chat opened with `user` on either side.
    pub fn subscribe_for_user<F>(&self, user: UserId, on_insert: F) -> DataResult<SubscriptionHandle>
    where
        F: FnMut(Chat) + Send + 'static,
    {
        let filter = ChangeFilter::any_of([
            RowFilter::eq(ChatColumn::UserId1, user),
            RowFilter::eq(ChatColumn::UserId2, user),
        ]);
        self.dispatcher
            .subscribe(ChannelScope::UserChats(user), filter, on_insert)
    }
}

/// Messages of a chat.
#[derive(Clone)]
pub struct Messages {
    client: DataClient,
    dispatcher: SubscriptionDispatcher,
}

impl Messages {
    pub fn new(client: DataClient, dispatcher: SubscriptionDispatcher) -> Self {
        Self { client, dispatcher }
    }

    pub(crate) fn backlog(&self) -> usize {
        self.dispatcher.buffer()
    }

    /// Visible messages of `chat`, oldest first.
    pub async fn for_chat(&self, chat: ChatId) -> DataResult<Vec<Message>> {
        self.client
            .from::<Message>()
            .select::<Message>()
            .eq(MessageColumn::ChatId, chat)
            .eq(MessageColumn::Visible, true)
            .order(MessageColumn::CreatedAt, true)
            .many()
            .await
    }

    pub async fn send(&self, chat: ChatId, sender: UserId, text: &str) -> DataResult<MessageKey> {
        if text.trim().is_empty() {
            return Err(ValidationError::empty_field("logged_message").into());
        }
        let patch = MessagePatch {
            chat_id: Some(chat),
            sender_id: Some(sender),
            logged_message: Some(text.to_string()),
            ..Default::default()
        };
        self.client
            .from::<Message>()
            .insert(&patch)?
            .returning::<MessageKey>()
            .one()
            .await
    }

    pub async fn hide(&self, id: MessageId) -> DataResult<MessageKey> {
        self.client
            .from::<Message>()
            .update(&hidden())?
            .eq(MessageColumn::Id, id)
            .returning::<MessageKey>()
            .one()
            .await
    }

    /// Hides everything `sender` wrote in `chat`.
    pub async fn hide_all(&self, chat: ChatId, sender: UserId) -> DataResult<Vec<MessageKey>> {
        self.client
            .from::<Message>()
            .update(&hidden())?
            .eq(MessageColumn::ChatId, chat)
            .eq(MessageColumn::SenderId, sender)
            .returning::<MessageKey>()
            .many()
            .await
    }

    pub async fn remove(&self, id: MessageId) -> DataResult<MessageKey> {
        self.client
            .from::<Message>()
            .delete()
            .eq(MessageColumn::Id, id)
            .returning::<MessageKey>()
            .one()
            .await
    }

    /// Deletes everything `sender` wrote in `chat`.
    pub async fn remove_all(&self, chat: ChatId, sender: UserId) -> DataResult<Vec<MessageKey>> {
        self.client
            .from::<Message>()
            .delete()
            .eq(MessageColumn::ChatId, chat)
            .eq(MessageColumn::SenderId, sender)
            .returning::<MessageKey>()
            .many()
            .await
    }

    /// Calls `on_insert` for every message posted in `chat`.
    pub fn subscribe<F>(&self, chat: ChatId, on_insert: F) -> DataResult<SubscriptionHandle>
    where
        F: FnMut(Message) + Send + 'static,
    {
        self.dispatcher.subscribe(
            ChannelScope::Chat(chat),
            RowFilter::eq(MessageColumn::ChatId, chat).into(),
            on_insert,
        )
    }
}

fn hidden() -> MessagePatch {
    MessagePatch {
        visible: Some(false),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryBackend, InMemoryRealtime};
    use serde_json::json;
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryBackend>, Arc<InMemoryRealtime>, Chats, Messages) {
        let backend = Arc::new(InMemoryBackend::new());
        let realtime = Arc::new(InMemoryRealtime::new());
        let client = DataClient::new(backend.clone());
        let dispatcher = SubscriptionDispatcher::new(realtime.clone(), "mru_dev", 16);
        (
            backend,
            realtime,
            Chats::new(client.clone(), dispatcher.clone()),
            Messages::new(client, dispatcher),
        )
    }

    #[tokio::test]
    async fn for_user_matches_either_side_newest_first() {
        let (backend, _, chats, _) = setup();
        backend.respond_with("Chats", json!([]));
        let user = UserId::random();

        chats.for_user(user).await.unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(
            sent.param("or"),
            Some(format!("(user_id_1.eq.{},user_id_2.eq.{})", user, user))
        );
        assert_eq!(sent.param("order").as_deref(), Some("created_at.desc"));
    }

    #[tokio::test]
    async fn for_chat_reads_visible_messages_oldest_first() {
        let (backend, _, _, messages) = setup();
        backend.respond_with("Messages", json!([]));

        messages.for_chat(ChatId::new(8)).await.unwrap();

        let sent = &backend.requests()[0];
        assert_eq!(sent.param("chat_id").as_deref(), Some("eq.8"));
        assert_eq!(sent.param("visible").as_deref(), Some("eq.true"));
        assert_eq!(sent.param("order").as_deref(), Some("created_at.asc"));
    }

    #[tokio::test]
    async fn hide_all_is_scoped_to_chat_and_sender() {
        let (backend, _, _, messages) = setup();
        backend.respond_with("Messages", json!([{ "id": 1 }]));
        let sender = UserId::random();

        let hidden = messages.hide_all(ChatId::new(2), sender).await.unwrap();

        assert_eq!(hidden.len(), 1);
        let sent = &backend.requests()[0];
        assert_eq!(sent.body, Some(json!({ "visible": false })));
        assert_eq!(sent.param("chat_id").as_deref(), Some("eq.2"));
        assert_eq!(sent.param("sender_id"), Some(format!("eq.{}", sender)));
    }

    #[tokio::test]
    async fn empty_message_is_not_sent() {
        let (backend, _, _, messages) = setup();
        let result = messages.send(ChatId::new(1), UserId::random(), "   ").await;
        assert!(result.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn chat_with_yourself_is_rejected() {
        let (backend, _, chats, _) = setup();
        let user = UserId::random();
        assert!(chats.create(user, user).await.unwrap_err().is_validation());
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn subscribe_filters_on_chat_id() {
        let (_, realtime, _, messages) = setup();
        let handle = messages.subscribe(ChatId::new(5), |_m| {}).unwrap();
        tokio::task::yield_now().await;

        let joins = realtime.joins();
        assert_eq!(joins[0].name.as_str(), "chat-5");
        assert_eq!(joins[0].bindings[0].filter.as_deref(), Some("chat_id=eq.5"));
        handle.unsubscribe().await;
    }
}
