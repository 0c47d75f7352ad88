//! Schema module - typed rows of the backend tables.
//!
//! Every table is a concrete record type declared with [`row!`](crate::row).
//! Columns are enum values, so a query can only name columns that exist.

mod macros;
mod rows;

pub use rows::*;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// A column of one table.
pub trait Column: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Name of the column on the wire.
    fn name(&self) -> &'static str;

    /// Every column of the table, in declaration order.
    fn all() -> &'static [Self];
}

/// A record of one backend table.
pub trait Row: Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static {
    /// Table name as addressed by the REST API.
    const TABLE: &'static str;

    type Column: Column;

    /// Same columns, each optional. Used for partial selects and update bodies.
    type Patch: Serialize + DeserializeOwned + Default + Clone + fmt::Debug + Send + Sync + 'static;
}
