//! Reconciliation: match live, currently-connected clients against stored
//! identities.

use tracing::debug;

use roster_core::{ClientIdentity, LiveClient};
use roster_store::IdentityStore;

use crate::errors::EngineError;

/// Cross-reference a live roster against the identity store.
///
/// Returns the stored identity for every live client that has one,
/// preserving input order. Live clients with no stored identity are dropped
/// after a debug log — they are not yet "known" (their connect event has not
/// been processed, or its write failed). Read only; safe to run concurrently
/// with event processing.
pub fn reconcile(
    store: &IdentityStore,
    live: &[LiveClient],
) -> Result<Vec<ClientIdentity>, EngineError> {
    let mut known = Vec::with_capacity(live.len());
    for client in live {
        match store.find_by_unique_id(&client.unique_id)? {
            Some(identity) => known.push(identity),
            None => {
                debug!(
                    unique_id = %client.unique_id,
                    nickname = %client.nickname,
                    "live client has no stored identity yet"
                );
            }
        }
    }
    Ok(known)
}
