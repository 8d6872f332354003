//! Identity types: the persisted [`ClientIdentity`] and the ephemeral
//! [`LiveClient`] sourced from the voice server's roster query.

use serde::{Deserialize, Serialize};

/// Connection kind reported by the voice server.
///
/// Server-query and monitor connections show up in the raw client list but
/// are not real users and are filtered out before reconciliation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    /// A real user connection.
    #[serde(rename = "regular")]
    Regular,
    /// A server-query or monitor connection.
    #[serde(rename = "serverQuery")]
    ServerQuery,
}

/// A persisted client identity, keyed by the server-assigned unique
/// identifier.
///
/// `nickname`, `created`, and `database_id` are identity facts fixed at first
/// observation; `last_connected`, `ip_address`, `platform`, and `country` are
/// overwritten on every connect. `time_spent` is cumulative minutes over all
/// completed sessions and never decreases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    /// Stable unique identifier assigned by the voice server.
    pub unique_id: String,
    /// Display name at first observation.
    pub nickname: String,
    /// Server-side database ID.
    pub database_id: i64,
    /// Epoch seconds the server first saw this identity.
    pub created: i64,
    /// Epoch seconds of the most recent connect.
    pub last_connected: i64,
    /// Last-observed IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Last-observed client platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Last-observed country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Cumulative minutes connected, `None` until the first completed session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<i64>,
    /// Whether a session is currently open (connect seen, no disconnect yet).
    pub session_open: bool,
}

impl ClientIdentity {
    /// Cumulative minutes connected, treating "never completed a session"
    /// as zero.
    pub fn minutes_spent(&self) -> i64 {
        self.time_spent.unwrap_or(0)
    }
}

/// A currently connected client, as reported by the transport's roster query.
///
/// Exists only for the duration of a connection and is never persisted
/// directly: on connect it is absorbed into a [`ClientIdentity`], otherwise
/// it is only used to look one up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveClient {
    /// Stable unique identifier assigned by the voice server.
    pub unique_id: String,
    /// Current display name.
    pub nickname: String,
    /// Server-side database ID.
    pub database_id: i64,
    /// Epoch seconds the server first saw this identity.
    pub created: i64,
    /// Epoch seconds this connection was established.
    pub last_connected: i64,
    /// Connection IP address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client platform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Country code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// Connection kind.
    pub client_type: ClientType,
}

impl LiveClient {
    /// Whether this is a real user connection (not server-query/monitor).
    pub fn is_regular(&self) -> bool {
        self.client_type == ClientType::Regular
    }
}
