//! Transport-boundary errors.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the transport seam.
///
/// All of these are fatal to the calling operation; retry policy, if any,
/// belongs to the transport implementation itself.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Not connected to the voice server.
    #[error("not connected to the voice server")]
    NotConnected,

    /// The roster query failed server-side.
    #[error("roster query failed: {0}")]
    Query(String),

    /// The roster query did not complete within the bounded wait.
    #[error("roster query timed out after {0:?}")]
    Timeout(Duration),

    /// The event stream fell behind and dropped notifications.
    #[error("event stream lagged, {missed} notifications dropped")]
    Lagged {
        /// Number of notifications lost.
        missed: u64,
    },
}
