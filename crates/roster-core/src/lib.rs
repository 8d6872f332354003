//! # roster-core
//!
//! Foundation types for the roster presence tracker.
//!
//! This crate provides the shared vocabulary that the store and engine crates
//! depend on:
//!
//! - **Identities**: [`identity::ClientIdentity`] (persisted) and
//!   [`identity::LiveClient`] (ephemeral, sourced from the transport)
//! - **Notices**: [`events::ConnectNotice`], [`events::DisconnectNotice`] —
//!   validated data-transfer structs built once at the transport boundary
//! - **Events**: [`events::PresenceEvent`] connect/disconnect notifications
//! - **Transport seam**: [`transport::VoiceTransport`] trait and
//!   [`errors::TransportError`]
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `roster-store` and `roster-engine`.

#![deny(unsafe_code)]

pub mod errors;
pub mod events;
pub mod identity;
pub mod transport;

pub use errors::TransportError;
pub use events::{ConnectNotice, DisconnectNotice, PresenceEvent};
pub use identity::{ClientIdentity, ClientType, LiveClient};
pub use transport::VoiceTransport;
