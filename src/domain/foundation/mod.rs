//! Foundation module - Shared domain primitives.
//!
//! Identifiers, the error taxonomy and the state machine trait used by every
//! other domain module.

mod errors;
mod ids;
mod state_machine;

pub use errors::{present, BackendError, DataError, DataResult, ValidationError};
pub use ids::{
    CartId, CategoryId, ChatId, InteractionId, MessageId, ProductId, ProfileId, ReportId,
    ReviewId, UserId,
};
pub use state_machine::StateMachine;
