//! SubscriptionDispatcher - typed realtime subscriptions over the transport.
//!
//! `subscribe` derives the channel name from the scope, renders one insert
//! binding per filter alternative, and hands the join to a background task.
//! It returns at once; the task joins, then decodes every insert into `R`
//! and calls the callback in arrival order.
//!
//! ```ignore
//! let handle = dispatcher.subscribe(
//!     ChannelScope::Chat(chat),
//!     RowFilter::<Message>::eq(MessageColumn::ChatId, chat).into(),
//!     move |message: Message| println!("{}", message.logged_message),
//! )?;
//! // ...
//! handle.unsubscribe().await;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::foundation::{DataResult, ValidationError};
use crate::domain::realtime::{
    ChangeBinding, ChangeFilter, ChannelName, ChannelScope, ChannelSpec, INSERT,
};
use crate::domain::schema::Row;
use crate::ports::RealtimeTransport;

type Registry = Arc<Mutex<HashSet<ChannelName>>>;

fn release_name(registry: &Registry, name: &ChannelName) {
    registry
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .remove(name);
}

/// Opens realtime subscriptions; at most one per channel name at a time.
#[derive(Clone)]
pub struct SubscriptionDispatcher {
    transport: Arc<dyn RealtimeTransport>,
    schema: String,
    buffer: usize,
    open: Registry,
}

impl SubscriptionDispatcher {
    pub fn new(transport: Arc<dyn RealtimeTransport>, schema: impl Into<String>, buffer: usize) -> Self {
        Self {
            transport,
            schema: schema.into(),
            buffer: buffer.max(1),
            open: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Capacity of each channel's insert queue.
    pub fn buffer(&self) -> usize {
        self.buffer
    }

    /// Names of the subscriptions not yet released.
    pub fn open_channels(&self) -> Vec<ChannelName> {
        let mut names: Vec<ChannelName> = self
            .open
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn spec<R: Row>(&self, name: ChannelName, filter: &ChangeFilter<R>) -> ChannelSpec {
        let bindings = filter
            .rendered()
            .into_iter()
            .map(|filter| ChangeBinding {
                event: INSERT,
                schema: self.schema.clone(),
                table: R::TABLE,
                filter,
            })
            .collect();
        ChannelSpec { name, bindings }
    }

    /// Calls `on_insert` with every row inserted into `R`'s table that matches `filter`.
    ///
    /// Fails only if a subscription with the same channel name is still open.
    pub fn subscribe<R, F>(
        &self,
        scope: ChannelScope,
        filter: ChangeFilter<R>,
        mut on_insert: F,
    ) -> DataResult<SubscriptionHandle>
    where
        R: Row,
        F: FnMut(R) + Send + 'static,
    {
        let name = scope.channel_name();
        {
            let mut open = self
                .open
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !open.insert(name.clone()) {
                return Err(ValidationError::ChannelInUse {
                    channel: name.to_string(),
                }
                .into());
            }
        }

        let spec = self.spec(name.clone(), &filter);
        let (sink, mut inserts) = mpsc::channel(self.buffer);
        let active = Arc::new(AtomicBool::new(true));

        let transport = self.transport.clone();
        let task_active = active.clone();
        let task_name = name.clone();
        let task = tokio::spawn(async move {
            if let Err(error) = transport.join(spec, sink).await {
                tracing::warn!(channel = %task_name, %error, "channel join failed");
                return;
            }
            tracing::info!(channel = %task_name, "subscribed");

            while let Some(event) = inserts.recv().await {
                if !task_active.load(Ordering::Acquire) {
                    break;
                }
                match serde_json::from_value::<R>(event.record) {
                    Ok(row) => on_insert(row),
                    Err(error) => {
                        tracing::warn!(channel = %task_name, table = %event.table, %error, "skipping undecodable insert")
                    }
                }
            }
        });

        Ok(SubscriptionHandle {
            name,
            transport: self.transport.clone(),
            open: self.open.clone(),
            active,
            released: AtomicBool::new(false),
            task: Mutex::new(Some(task)),
        })
    }
}

/// Owner of one open subscription.
///
/// Dropping the handle without `unsubscribe` stops callbacks and releases the
/// channel in the background.
pub struct SubscriptionHandle {
    name: ChannelName,
    transport: Arc<dyn RealtimeTransport>,
    open: Registry,
    active: Arc<AtomicBool>,
    released: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("channel", &self.name)
            .field("released", &self.is_released())
            .finish()
    }
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &ChannelName {
        &self.name
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    /// Stops callbacks and leaves the channel.
    ///
    /// Idempotent, and safe before the join handshake completed. Once the
    /// first call returns no callback runs again.
    pub async fn unsubscribe(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.active.store(false, Ordering::Release);

        if let Some(task) = self.take_task() {
            task.abort();
            let _ = task.await;
        }
        if let Err(error) = self.transport.leave(&self.name).await {
            tracing::warn!(channel = %self.name, %error, "channel leave failed");
        }
        release_name(&self.open, &self.name);
        tracing::info!(channel = %self.name, "unsubscribed");
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.active.store(false, Ordering::Release);
        if let Some(task) = self.take_task() {
            task.abort();
        }
        release_name(&self.open, &self.name);

        let transport = self.transport.clone();
        let name = self.name.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                if let Err(error) = transport.leave(&name).await {
                    tracing::warn!(channel = %name, %error, "channel leave failed");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRealtime;
    use crate::domain::foundation::{ChatId, UserId};
    use crate::domain::realtime::RowFilter;
    use crate::domain::schema::{Chat, ChatColumn, Message, MessageColumn};

    fn dispatcher() -> (Arc<InMemoryRealtime>, SubscriptionDispatcher) {
        let transport = Arc::new(InMemoryRealtime::new());
        (
            transport.clone(),
            SubscriptionDispatcher::new(transport, "mru_dev", 16),
        )
    }

    #[tokio::test]
    async fn spec_has_one_binding_per_alternative() {
        let (transport, dispatcher) = dispatcher();
        let user = UserId::random();
        let filter = ChangeFilter::any_of([
            RowFilter::<Chat>::eq(ChatColumn::UserId1, user),
            RowFilter::<Chat>::eq(ChatColumn::UserId2, user),
        ]);

        let handle = dispatcher
            .subscribe(ChannelScope::UserChats(user), filter, |_chat: Chat| {})
            .unwrap();
        tokio::task::yield_now().await;

        let joins = transport.joins();
        assert_eq!(joins.len(), 1);
        let filters: Vec<_> = joins[0].bindings.iter().map(|b| b.filter.clone()).collect();
        assert_eq!(
            filters,
            vec![
                Some(format!("user_id_1=eq.{}", user)),
                Some(format!("user_id_2=eq.{}", user)),
            ]
        );
        assert_eq!(joins[0].bindings[0].table, "Chats");
        handle.unsubscribe().await;
    }

    #[tokio::test]
    async fn second_subscription_on_same_channel_is_rejected_until_released() {
        let (_, dispatcher) = dispatcher();
        let chat = ChatId::new(3);
        let filter = || -> ChangeFilter<Message> { RowFilter::eq(MessageColumn::ChatId, chat).into() };

        let first = dispatcher
            .subscribe(ChannelScope::Chat(chat), filter(), |_m: Message| {})
            .unwrap();
        let second = dispatcher.subscribe(ChannelScope::Chat(chat), filter(), |_m: Message| {});
        assert!(second.unwrap_err().is_validation());

        first.unsubscribe().await;
        assert!(dispatcher.open_channels().is_empty());
        let third = dispatcher.subscribe(ChannelScope::Chat(chat), filter(), |_m: Message| {});
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn dropped_handle_frees_the_name() {
        let (_, dispatcher) = dispatcher();
        let chat = ChatId::new(4);
        let handle = dispatcher
            .subscribe(
                ChannelScope::Chat(chat),
                ChangeFilter::<Message>::all(),
                |_m: Message| {},
            )
            .unwrap();
        drop(handle);
        assert!(dispatcher.open_channels().is_empty());
    }
}
