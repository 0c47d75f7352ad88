//! Domain layer: types and pure logic, no I/O.
//!
//! # Module Organization
//!
//! - `foundation` - ids, error taxonomy, state machine trait
//! - `schema` - typed table rows and columns
//! - `query` - projections, predicates, request model, response normalizer
//! - `realtime` - channel names, insert filters, join specifications
//! - `session` - identity, auth change events, session state, credential policy

pub mod foundation;
pub mod query;
pub mod realtime;
pub mod schema;
pub mod session;
