//! Realtime module - channel names, insert filters and join specifications.

mod change_filter;
mod channel;

pub use change_filter::{ChangeFilter, RowFilter};
pub use channel::{ChangeBinding, ChannelName, ChannelScope, ChannelSpec, InsertEvent};

/// Event name of row inserts in `postgres_changes` bindings.
pub const INSERT: &str = "INSERT";
