//! The [`VoiceTransport`] trait — the narrow seam to the voice server.
//!
//! The protocol client that actually speaks to the server lives outside this
//! repository. Whatever it is, it exposes exactly two capabilities here: a
//! roster query and a broadcast stream of presence notifications.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::errors::TransportError;
use crate::events::PresenceEvent;
use crate::identity::LiveClient;

/// Capabilities the presence engine consumes from the voice server.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Current connected-client list, all connection kinds included.
    ///
    /// Returns an empty list when nobody is connected; errors only when the
    /// query itself fails (for example, the transport is not connected).
    async fn client_list(&self) -> Result<Vec<LiveClient>, TransportError>;

    /// Subscribe to connect/disconnect notifications.
    ///
    /// The receiver observes every event emitted after this call. A slow
    /// consumer may lag and lose events rather than block the transport.
    fn subscribe(&self) -> broadcast::Receiver<PresenceEvent>;
}
