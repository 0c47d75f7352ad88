//! Session state as seen by the rest of the application.

use crate::domain::foundation::{DataError, StateMachine};

use super::events::{AuthChange, Identity};

/// Lifecycle phase of the process-wide session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Authenticated,
    Unauthenticated,
    Error,
}

impl StateMachine for SessionPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionPhase::*;
        match self {
            Loading => matches!(target, Authenticated | Unauthenticated | Error),
            // Only the initial fetch can fail; change events always name an outcome.
            Authenticated | Unauthenticated | Error => {
                matches!(target, Authenticated | Unauthenticated)
            }
        }
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionPhase::*;
        match self {
            Loading => vec![Authenticated, Unauthenticated, Error],
            Authenticated | Unauthenticated | Error => vec![Authenticated, Unauthenticated],
        }
    }
}

/// Current session value.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Authenticated(Identity),
    Unauthenticated,
    Error(DataError),
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Loading => SessionPhase::Loading,
            SessionState::Authenticated(_) => SessionPhase::Authenticated,
            SessionState::Unauthenticated => SessionPhase::Unauthenticated,
            SessionState::Error(_) => SessionPhase::Error,
        }
    }

    /// State produced by the initial session fetch.
    pub fn from_fetch(result: Result<Option<Identity>, DataError>) -> Self {
        match result {
            Ok(Some(identity)) => SessionState::Authenticated(identity),
            Ok(None) => SessionState::Unauthenticated,
            Err(error) => SessionState::Error(error),
        }
    }

    /// State produced by a change event.
    pub fn from_change(change: &AuthChange) -> Self {
        match change.identity() {
            Some(identity) => SessionState::Authenticated(identity.clone()),
            None => SessionState::Unauthenticated,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }
}
