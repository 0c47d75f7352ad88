//! Application layer - typed queries, feature accessors and coordination.
//!
//! - `client` composes typed queries and runs them through the normalizer
//! - feature modules (`catalogue`, `listing`, `messaging`, ...) expose one
//!   accessor per table group
//! - `dispatcher` owns realtime subscriptions, `synchronizer` owns the
//!   session and `live` keeps fetched collections current
//! - `marketplace` wires everything over one set of ports

pub mod auth;
pub mod catalogue;
pub mod client;
pub mod dispatcher;
pub mod interact;
pub mod listing;
pub mod live;
pub mod marketplace;
pub mod messaging;
pub mod ordering;
pub mod profiles;
pub mod reporting;
pub mod review;
pub mod synchronizer;

pub use auth::AuthService;
pub use catalogue::{Categories, ProductFilter, ProductKey, Products};
pub use client::{DataClient, Query, TableQuery};
pub use dispatcher::{SubscriptionDispatcher, SubscriptionHandle};
pub use interact::Interactions;
pub use listing::{Listings, ProductAttributes, ProductDraft};
pub use live::{ChatFeed, ChatList, InsertSink, Keyed, LiveCollection, LiveState, LoadPhase};
pub use marketplace::Marketplace;
pub use messaging::{ChatKey, Chats, MessageKey, Messages};
pub use ordering::{CartKey, CartLine, Carts};
pub use profiles::Profiles;
pub use reporting::{ReportComposer, ReportKey, Reports};
pub use review::{ProductRating, ReviewComposer, ReviewKey, Reviews, SellerRating};
pub use synchronizer::AuthSynchronizer;
