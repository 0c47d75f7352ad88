//! AuthSynchronizer - owner of the process-wide session value.
//!
//! On start the change listener is registered first, then the initial fetch
//! is issued. A single driver task applies both in arrival order:
//!
//! - the fetch result moves `Loading` to its outcome, unless a change event
//!   was already applied, in which case the fetch result is discarded
//! - every change event replaces the state
//!
//! Readers get a `watch` receiver; nothing outside the driver writes the
//! session.

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::foundation::StateMachine;
use crate::domain::session::{Identity, SessionState};
use crate::ports::AuthGateway;

/// Moves the session to `next` if the phase graph allows it.
fn apply(state: &watch::Sender<SessionState>, next: SessionState, cause: &'static str) {
    let current = state.borrow().phase();
    match current.transition_to(next.phase()) {
        Ok(phase) => {
            tracing::info!(from = ?current, to = ?phase, cause, "session transition");
            state.send_replace(next);
        }
        Err(error) => {
            tracing::warn!(%error, cause, "ignoring session transition");
        }
    }
}

/// Drives the session state from the auth gateway.
pub struct AuthSynchronizer {
    state: watch::Receiver<SessionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AuthSynchronizer {
    /// Subscribes to changes, then fetches the initial session in the background.
    pub fn start(gateway: Arc<dyn AuthGateway>) -> Self {
        let mut changes = gateway.subscribe();
        let (sender, state) = watch::channel(SessionState::Loading);

        let task = tokio::spawn(async move {
            let fetch = {
                let gateway = gateway.clone();
                async move { gateway.current_identity().await }
            };
            tokio::pin!(fetch);
            let mut fetched = false;
            let mut changed = false;

            loop {
                tokio::select! {
                    biased;

                    change = changes.recv() => match change {
                        Ok(change) => {
                            changed = true;
                            apply(&sender, SessionState::from_change(&change), change.event_name());
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "session changes lagged");
                        }
                        Err(RecvError::Closed) => break,
                    },

                    result = &mut fetch, if !fetched => {
                        fetched = true;
                        if changed {
                            tracing::debug!("initial session fetch superseded by a change event");
                        } else {
                            apply(&sender, SessionState::from_fetch(result), "INITIAL_FETCH");
                        }
                    }
                }
            }
        });

        Self {
            state,
            task: Mutex::new(Some(task)),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every transition after this call.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        let mut state = self.state.clone();
        let _ = state.borrow_and_update();
        state
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Waits until the state leaves `Loading`.
    pub async fn settled(&self) -> SessionState {
        let mut state = self.state.clone();
        if let Ok(settled) = state.wait_for(|s| !s.is_loading()).await {
            return settled.clone();
        }
        let current = state.borrow().clone();
        current
    }

    /// Stops the driver. No transition happens after this returns.
    pub async fn teardown(&self) {
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
            let _ = task.await;
            tracing::debug!("session synchronizer stopped");
        }
    }
}

impl Drop for AuthSynchronizer {
    fn drop(&mut self) {
        if let Some(task) = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MockAuthGateway;
    use crate::domain::foundation::{BackendError, UserId};
    use crate::domain::session::{AuthChange, SessionPhase};

    fn identity() -> Identity {
        Identity::new(UserId::random(), "sam@mtroyal.ca")
    }

    #[tokio::test]
    async fn stored_session_becomes_authenticated() {
        let who = identity();
        let gateway = Arc::new(MockAuthGateway::new().with_session(who.clone()));

        let sync = AuthSynchronizer::start(gateway);

        assert_eq!(sync.settled().await, SessionState::Authenticated(who));
    }

    #[tokio::test]
    async fn no_session_becomes_unauthenticated() {
        let sync = AuthSynchronizer::start(Arc::new(MockAuthGateway::new()));
        assert_eq!(sync.settled().await, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn failed_fetch_becomes_error() {
        let gateway = MockAuthGateway::new().with_fetch_error(BackendError::new(503, "unavailable").into());
        let sync = AuthSynchronizer::start(Arc::new(gateway));
        assert_eq!(sync.settled().await.phase(), SessionPhase::Error);
    }

    #[tokio::test]
    async fn starts_loading_while_fetch_is_held() {
        let gateway = Arc::new(MockAuthGateway::new());
        let release = gateway.hold_current_identity();

        let sync = AuthSynchronizer::start(gateway);
        tokio::task::yield_now().await;
        assert!(sync.is_loading());

        release.send(()).ok();
        assert_eq!(sync.settled().await, SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn change_after_settling_replaces_state() {
        let gateway = Arc::new(MockAuthGateway::new());
        let sync = AuthSynchronizer::start(gateway.clone());
        sync.settled().await;

        let who = identity();
        let mut watch = sync.watch();
        gateway.emit(AuthChange::SignedIn(who.clone()));
        watch.changed().await.unwrap();

        assert_eq!(sync.identity(), Some(who));
    }

    #[tokio::test]
    async fn watch_after_settling_waits_for_the_next_change() {
        let gateway = Arc::new(MockAuthGateway::new());
        let sync = AuthSynchronizer::start(gateway.clone());
        sync.settled().await;

        let mut watch = sync.watch();
        assert!(!watch.has_changed().unwrap());

        let who = identity();
        gateway.emit(AuthChange::SignedIn(who.clone()));
        watch.changed().await.unwrap();

        assert_eq!(*watch.borrow_and_update(), SessionState::Authenticated(who));
    }

    #[tokio::test]
    async fn teardown_stops_transitions() {
        let gateway = Arc::new(MockAuthGateway::new());
        let sync = AuthSynchronizer::start(gateway.clone());
        sync.settled().await;

        sync.teardown().await;
        gateway.emit(AuthChange::SignedIn(identity()));
        tokio::task::yield_now().await;

        assert_eq!(sync.state(), SessionState::Unauthenticated);
    }
}
