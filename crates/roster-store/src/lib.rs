//! # roster-store
//!
//! SQLite-backed identity store for the roster presence tracker.
//!
//! - **Connection pool**: r2d2 over rusqlite with WAL and a bounded checkout
//!   wait, so store calls cannot hang indefinitely
//! - **Migrations**: `user_version`-gated DDL in [`sqlite::migrations`]
//! - **Repository**: stateless [`sqlite::repository::IdentityRepo`], every
//!   method takes `&Connection`
//! - **Store**: [`store::IdentityStore`] — composes repository operations
//!   under per-identifier write locks with busy-retry
//!
//! ## Crate Position
//!
//! Storage layer. Depends on `roster-core`. Depended on by `roster-engine`.

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;

pub use errors::{Result, StoreError};
pub use sqlite::connection::ConnectionPool;
pub use store::{ConnectApplied, IdentityStore, SessionClosed};
