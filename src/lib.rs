//! Campus Market - client-side data access for the campus marketplace
//!
//! Typed queries over a Postgrest-compatible REST API, realtime insert
//! subscriptions over a Phoenix channel socket and an auth session kept in
//! sync with a GoTrue-compatible auth service.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
