//! Session module - authenticated identity, change events, session state
//! machine and credential policy.

mod events;
mod policy;
mod state;

pub use events::{AuthChange, Identity};
pub use policy::{
    check_name, check_password, check_user_name, InstitutionEmail, MAX_PASSWORD_LEN,
    MIN_PASSWORD_LEN,
};
pub use state::{SessionPhase, SessionState};
