//! Live collections - a fetched snapshot kept current by realtime inserts.
//!
//! One driver task owns the state and drains a single queue that carries
//! fetch completions and inserts in arrival order:
//!
//! - `refresh` bumps the generation; completions of older generations are dropped
//! - inserts arriving while loading (or failed) are buffered and replayed onto
//!   the next snapshot, so a fetch resolving after an event never erases it;
//!   the buffer keeps the newest `backlog` rows
//! - inserts arriving when ready are appended
//!
//! Rows whose key is already present are skipped in both cases.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::hash::Hash;
use std::ops::Deref;
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::application::dispatcher::SubscriptionHandle;
use crate::application::messaging::{Chats, Messages};
use crate::domain::foundation::{ChatId, DataError, DataResult, MessageId, StateMachine, UserId};
use crate::domain::schema::{Chat, Message};

/// Row with a stable identity.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Send + 'static;

    fn key(&self) -> Self::Key;
}

impl Keyed for Message {
    type Key = MessageId;

    fn key(&self) -> MessageId {
        self.id
    }
}

impl Keyed for Chat {
    type Key = ChatId;

    fn key(&self) -> ChatId {
        self.id
    }
}

/// Load phase of a live collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Loading,
    Ready,
    Failed,
}

impl StateMachine for LoadPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LoadPhase::*;
        match self {
            Loading => vec![Ready, Failed],
            Ready => vec![Ready, Loading],
            Failed => vec![Loading],
        }
    }
}

/// Current contents of a live collection.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveState<T> {
    Loading,
    Ready(Vec<T>),
    Failed(DataError),
}

impl<T> LiveState<T> {
    pub fn phase(&self) -> LoadPhase {
        match self {
            LiveState::Loading => LoadPhase::Loading,
            LiveState::Ready(_) => LoadPhase::Ready,
            LiveState::Failed(_) => LoadPhase::Failed,
        }
    }

    pub fn items(&self) -> Option<&[T]> {
        match self {
            LiveState::Ready(items) => Some(items),
            _ => None,
        }
    }
}

enum Input<T> {
    Refresh,
    Fetched {
        generation: u64,
        result: DataResult<Vec<T>>,
    },
    Inserted(T),
}

/// Feeds realtime inserts into a live collection.
pub struct InsertSink<T> {
    inputs: mpsc::UnboundedSender<Input<T>>,
}

impl<T> InsertSink<T> {
    pub fn push(&self, row: T) {
        // The driver is gone once the collection closed.
        let _ = self.inputs.send(Input::Inserted(row));
    }
}

struct Driver<T: Keyed, F> {
    fetch: F,
    inputs: mpsc::UnboundedSender<Input<T>>,
    state: watch::Sender<LiveState<T>>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    buffered: VecDeque<T>,
    backlog: usize,
    seen: HashSet<T::Key>,
}

impl<T, F, Fut> Driver<T, F>
where
    T: Keyed + Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = DataResult<Vec<T>>> + Send + 'static,
{
    fn set(&self, next: LiveState<T>) {
        let current = self.state.borrow().phase();
        if current == next.phase() && current != LoadPhase::Ready {
            return;
        }
        match current.transition_to(next.phase()) {
            Ok(_) => {
                self.state.send_replace(next);
            }
            Err(error) => tracing::warn!(%error, "ignoring live collection transition"),
        }
    }

    fn refresh(&mut self) {
        self.generation += 1;
        if let Some(previous) = self.in_flight.take() {
            previous.abort();
        }
        self.set(LiveState::Loading);

        let generation = self.generation;
        let inputs = self.inputs.clone();
        let fetch = (self.fetch)();
        self.in_flight = Some(tokio::spawn(async move {
            let result = fetch.await;
            let _ = inputs.send(Input::Fetched { generation, result });
        }));
    }

    fn fetched(&mut self, generation: u64, result: DataResult<Vec<T>>) {
        if generation != self.generation {
            tracing::debug!(generation, current = self.generation, "dropping stale fetch");
            return;
        }
        self.in_flight = None;
        match result {
            Ok(rows) => {
                self.seen.clear();
                let mut items = Vec::with_capacity(rows.len() + self.buffered.len());
                for row in rows.into_iter().chain(self.buffered.drain(..)) {
                    if self.seen.insert(row.key()) {
                        items.push(row);
                    }
                }
                self.set(LiveState::Ready(items));
            }
            Err(error) => {
                tracing::warn!(%error, "live collection fetch failed");
                self.set(LiveState::Failed(error));
            }
        }
    }

    fn inserted(&mut self, row: T) {
        if self.state.borrow().phase() != LoadPhase::Ready {
            if self.buffered.len() >= self.backlog {
                self.buffered.pop_front();
                tracing::warn!(backlog = self.backlog, "insert backlog full, dropping oldest");
            }
            self.buffered.push_back(row);
            return;
        }
        if !self.seen.insert(row.key()) {
            return;
        }
        self.state.send_modify(|state| {
            if let LiveState::Ready(items) = state {
                items.push(row);
            }
        });
    }

    async fn run(mut self, mut queue: mpsc::UnboundedReceiver<Input<T>>) {
        self.refresh();
        while let Some(input) = queue.recv().await {
            match input {
                Input::Refresh => self.refresh(),
                Input::Fetched { generation, result } => self.fetched(generation, result),
                Input::Inserted(row) => self.inserted(row),
            }
        }
    }
}

impl<T: Keyed, F> Drop for Driver<T, F> {
    fn drop(&mut self) {
        if let Some(fetch) = self.in_flight.take() {
            fetch.abort();
        }
    }
}

/// A fetched collection kept current by realtime inserts.
pub struct LiveCollection<T> {
    inputs: mpsc::UnboundedSender<Input<T>>,
    state: watch::Receiver<LiveState<T>>,
    subscription: Mutex<Option<SubscriptionHandle>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl<T> LiveCollection<T>
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    /// Subscribes through `subscribe`, then issues the first fetch.
    ///
    /// At most `backlog` inserts are held while no snapshot is ready.
    pub fn open<F, Fut, S>(fetch: F, subscribe: S, backlog: usize) -> DataResult<Self>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = DataResult<Vec<T>>> + Send + 'static,
        S: FnOnce(InsertSink<T>) -> DataResult<SubscriptionHandle>,
    {
        let (inputs, queue) = mpsc::unbounded_channel();
        let subscription = subscribe(InsertSink {
            inputs: inputs.clone(),
        })?;
        let (state_tx, state) = watch::channel(LiveState::Loading);

        let driver = Driver {
            fetch,
            inputs: inputs.clone(),
            state: state_tx,
            generation: 0,
            in_flight: None,
            buffered: VecDeque::new(),
            backlog: backlog.max(1),
            seen: HashSet::new(),
        };
        let task = tokio::spawn(driver.run(queue));

        Ok(Self {
            inputs,
            state,
            subscription: Mutex::new(Some(subscription)),
            driver: Mutex::new(Some(task)),
        })
    }

    pub fn state(&self) -> LiveState<T> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every change after this call.
    pub fn watch(&self) -> watch::Receiver<LiveState<T>> {
        let mut state = self.state.clone();
        let _ = state.borrow_and_update();
        state
    }

    /// Waits until the collection leaves `Loading`.
    pub async fn settled(&self) -> LiveState<T> {
        let mut state = self.state.clone();
        if let Ok(settled) = state.wait_for(|s| s.phase() != LoadPhase::Loading).await {
            return settled.clone();
        }
        let current = state.borrow().clone();
        current
    }

    /// Discards the snapshot and fetches again.
    pub fn refresh(&self) {
        let _ = self.inputs.send(Input::Refresh);
    }

    /// Unsubscribes and stops the driver. The last state stays readable.
    pub async fn close(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe().await;
        }
        let driver = self
            .driver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(driver) = driver {
            driver.abort();
            let _ = driver.await;
        }
    }
}

impl<T> Drop for LiveCollection<T> {
    fn drop(&mut self) {
        if let Some(driver) = self
            .driver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            driver.abort();
        }
    }
}

/// Messages of one chat, oldest first, with new messages appended live.
pub struct ChatFeed(LiveCollection<Message>);

impl ChatFeed {
    pub fn open(messages: &Messages, chat: ChatId) -> DataResult<Self> {
        let reader = messages.clone();
        let live = LiveCollection::open(
            move || {
                let reader = reader.clone();
                async move { reader.for_chat(chat).await }
            },
            |sink| messages.subscribe(chat, move |message| sink.push(message)),
            messages.backlog(),
        )?;
        Ok(Self(live))
    }
}

impl Deref for ChatFeed {
    type Target = LiveCollection<Message>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Chats of one user, with newly opened chats appended live.
pub struct ChatList(LiveCollection<Chat>);

impl ChatList {
    pub fn open(chats: &Chats, user: UserId) -> DataResult<Self> {
        let reader = chats.clone();
        let live = LiveCollection::open(
            move || {
                let reader = reader.clone();
                async move { reader.for_user(user).await }
            },
            |sink| chats.subscribe_for_user(user, move |chat| sink.push(chat)),
            chats.backlog(),
        )?;
        Ok(Self(live))
    }
}

impl Deref for ChatList {
    type Target = LiveCollection<Chat>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
