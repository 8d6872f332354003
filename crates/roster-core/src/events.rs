//! Presence notifications from the transport.
//!
//! The transport layer constructs a validated [`ConnectNotice`] or
//! [`DisconnectNotice`] once, at the protocol boundary, from whatever shape
//! the voice-server library exposes. Everything downstream works with these
//! structs and never reaches into transport payloads.

use serde::{Deserialize, Serialize};

use crate::identity::LiveClient;

/// Contact and identity fields carried by a connect notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectNotice {
    /// Stable unique identifier assigned by the voice server.
    pub unique_id: String,
    /// Display name at connect time.
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
}

impl From<LiveClient> for ConnectNotice {
    fn from(client: LiveClient) -> Self {
        Self {
            unique_id: client.unique_id,
            nickname: client.nickname,
            database_id: client.database_id,
            created: client.created,
            last_connected: client.last_connected,
            ip_address: client.ip_address,
            platform: client.platform,
            country: client.country,
        }
    }
}

/// Fields carried by a disconnect notification.
///
/// Only the unique identifier matters for accounting; the nickname is kept
/// for log lines.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisconnectNotice {
    /// Stable unique identifier assigned by the voice server.
    pub unique_id: String,
    /// Display name at disconnect time.
    pub nickname: String,
}

/// A presence notification delivered by the transport's event stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PresenceEvent {
    /// A client connected to the server.
    #[serde(rename = "connect")]
    Connect {
        /// The connecting client.
        client: ConnectNotice,
    },

    /// A client disconnected from the server.
    #[serde(rename = "disconnect")]
    Disconnect {
        /// The disconnecting client.
        client: DisconnectNotice,
    },
}

impl PresenceEvent {
    /// Unique identifier of the client this event concerns.
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Connect { client } => &client.unique_id,
            Self::Disconnect { client } => &client.unique_id,
        }
    }

    /// Event type discriminator as it appears on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect { .. } => "disconnect",
        }
    }
}
