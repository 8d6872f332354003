//! Engine error type.

use thiserror::Error;

use roster_core::TransportError;
use roster_store::StoreError;

/// Errors surfaced by engine operations.
///
/// An error from one identifier's event never aborts processing of other
/// identifiers' events; the subscription loop logs and continues.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The transport query or event stream failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The identity store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
