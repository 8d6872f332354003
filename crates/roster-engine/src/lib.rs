//! # roster-engine
//!
//! Presence reconciliation and session accounting for a voice server.
//!
//! - **Roster snapshot**: [`roster::fetch_online_clients`] — the live
//!   connected-client list, filtered to real users
//! - **Reconciler**: [`reconcile::reconcile`] — cross-references a live
//!   roster against stored identities
//! - **Session tracker**: [`tracker::SessionTracker`] — the connect/disconnect
//!   state machine over the identity store
//! - **Subscription**: [`subscription::SubscriptionHandle`] — explicit
//!   attach/teardown of the transport event loop
//!
//! ## Crate Position
//!
//! Engine layer. Depends on `roster-core` and `roster-store`.

#![deny(unsafe_code)]

pub mod errors;
pub mod metrics;
pub mod reconcile;
pub mod roster;
pub mod subscription;
pub mod tracker;

pub use errors::EngineError;
pub use reconcile::reconcile;
pub use roster::fetch_online_clients;
pub use subscription::SubscriptionHandle;
pub use tracker::{ConnectOutcome, DisconnectOutcome, SessionTracker};
