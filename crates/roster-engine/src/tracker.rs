//! The session tracker — the connect/disconnect state machine.
//!
//! Per unique identifier the lifecycle is UNKNOWN (no stored identity) →
//! OFFLINE (stored, session closed) → ONLINE (stored, session open), with
//! ONLINE ⇄ OFFLINE driven by connect/disconnect notices. The tracker does
//! not assume strict alternation: replayed connects only refresh transient
//! fields, and replayed disconnects resolve to a logged no-op instead of
//! double-counting minutes.

use std::sync::Arc;

use ::metrics::counter;
use tracing::{debug, info, warn};

use roster_core::{ConnectNotice, DisconnectNotice, PresenceEvent};
use roster_store::{ConnectApplied, IdentityStore, SessionClosed};

use crate::errors::EngineError;
use crate::metrics::{
    PRESENCE_CONNECTS_TOTAL, PRESENCE_DISCONNECTS_TOTAL, PRESENCE_STALE_DISCONNECTS_TOTAL,
};

/// Outcome of processing a connect notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// First-ever connect: a new identity was created.
    Created,
    /// Known identity: contact fields refreshed, session reopened.
    Updated,
}

/// Outcome of processing a disconnect notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The open session was closed and its duration recorded.
    Recorded {
        /// Whole minutes added by this session.
        minutes: i64,
        /// Cumulative minutes after the update.
        total: i64,
    },
    /// No stored identity for this identifier — a disconnect with no known
    /// connect. Logged, nothing mutated.
    UnknownIdentity,
    /// The identity exists but no session is open — a stale or replayed
    /// disconnect. Logged, nothing mutated.
    SessionNotOpen,
}

/// Processes presence notifications against the identity store.
#[derive(Clone)]
pub struct SessionTracker {
    store: Arc<IdentityStore>,
}

impl SessionTracker {
    /// Create a tracker over the given store.
    pub fn new(store: Arc<IdentityStore>) -> Self {
        Self { store }
    }

    /// The identity store this tracker writes to.
    pub fn store(&self) -> &Arc<IdentityStore> {
        &self.store
    }

    /// Process a connect notice.
    ///
    /// Creates the identity on first-ever connect (`time_spent` unset);
    /// otherwise refreshes only the transient contact fields. Idempotent
    /// under replay.
    pub fn handle_connect(&self, notice: &ConnectNotice) -> Result<ConnectOutcome, EngineError> {
        let outcome = match self.store.apply_connect(notice)? {
            ConnectApplied::Created(_) => {
                info!(nickname = %notice.nickname, "client added to database");
                counter!(PRESENCE_CONNECTS_TOTAL, "outcome" => "created").increment(1);
                ConnectOutcome::Created
            }
            ConnectApplied::Updated => {
                info!(nickname = %notice.nickname, "client connected");
                counter!(PRESENCE_CONNECTS_TOTAL, "outcome" => "updated").increment(1);
                ConnectOutcome::Updated
            }
        };
        Ok(outcome)
    }

    /// Process a disconnect notice, accounting elapsed time as of now.
    pub fn handle_disconnect(
        &self,
        notice: &DisconnectNotice,
    ) -> Result<DisconnectOutcome, EngineError> {
        self.handle_disconnect_at(notice, chrono::Utc::now().timestamp())
    }

    /// Process a disconnect notice as of an explicit timestamp.
    ///
    /// Elapsed time is `floor((now_secs - last_connected) / 60)` whole
    /// minutes, clamped to zero when the clock went backwards.
    pub fn handle_disconnect_at(
        &self,
        notice: &DisconnectNotice,
        now_secs: i64,
    ) -> Result<DisconnectOutcome, EngineError> {
        let outcome = match self.store.close_session(&notice.unique_id, now_secs)? {
            SessionClosed::Recorded { minutes, total } => {
                info!(
                    nickname = %notice.nickname,
                    minutes,
                    total,
                    "client disconnected"
                );
                counter!(PRESENCE_DISCONNECTS_TOTAL).increment(1);
                DisconnectOutcome::Recorded { minutes, total }
            }
            SessionClosed::NotOpen => {
                debug!(
                    nickname = %notice.nickname,
                    unique_id = %notice.unique_id,
                    "disconnect without an open session, skipping"
                );
                counter!(PRESENCE_STALE_DISCONNECTS_TOTAL, "reason" => "not_open").increment(1);
                DisconnectOutcome::SessionNotOpen
            }
            SessionClosed::Unknown => {
                warn!(
                    nickname = %notice.nickname,
                    unique_id = %notice.unique_id,
                    "disconnect for unknown identity, skipping"
                );
                counter!(PRESENCE_STALE_DISCONNECTS_TOTAL, "reason" => "unknown").increment(1);
                DisconnectOutcome::UnknownIdentity
            }
        };
        Ok(outcome)
    }

    /// Dispatch a presence event to the matching handler.
    pub fn handle_event(&self, event: &PresenceEvent) -> Result<(), EngineError> {
        match event {
            PresenceEvent::Connect { client } => {
                let _ = self.handle_connect(client)?;
            }
            PresenceEvent::Disconnect { client } => {
                let _ = self.handle_disconnect(client)?;
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;

    fn tracker() -> SessionTracker {
        SessionTracker::new(Arc::new(IdentityStore::in_memory().unwrap()))
    }

    fn connect(unique_id: &str, last_connected: i64) -> ConnectNotice {
        ConnectNotice {
            unique_id: unique_id.to_string(),
            nickname: "alice".to_string(),
            database_id: 12,
            created: 500,
            last_connected,
            ip_address: Some("10.0.0.1".to_string()),
            platform: Some("Linux".to_string()),
            country: Some("CZ".to_string()),
        }
    }

    fn disconnect(unique_id: &str) -> DisconnectNotice {
        DisconnectNotice {
            unique_id: unique_id.to_string(),
            nickname: "alice".to_string(),
        }
    }

    #[test]
    fn first_connect_creates_identity_without_time_spent() {
        let tracker = tracker();
        let outcome = tracker.handle_connect(&connect("uid=a", 0)).unwrap();
        assert_eq!(outcome, ConnectOutcome::Created);

        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.time_spent, None);
        assert!(row.session_open);
        assert_eq!(tracker.store().count().unwrap(), 1);
    }

    #[test]
    fn reconnect_updates_without_duplicating() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 0)).unwrap();

        let outcome = tracker.handle_connect(&connect("uid=a", 200)).unwrap();
        assert_eq!(outcome, ConnectOutcome::Updated);
        assert_eq!(tracker.store().count().unwrap(), 1);

        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.last_connected, 200);
    }

    #[test]
    fn connect_replay_is_harmless() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 100)).unwrap();
        tracker.handle_connect(&connect("uid=a", 100)).unwrap();

        assert_eq!(tracker.store().count().unwrap(), 1);
        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.time_spent, None);
    }

    #[test]
    fn disconnect_records_floor_minutes() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 0)).unwrap();

        let outcome = tracker
            .handle_disconnect_at(&disconnect("uid=a"), 125)
            .unwrap();
        assert_eq!(
            outcome,
            DisconnectOutcome::Recorded {
                minutes: 2,
                total: 2
            }
        );
    }

    #[test]
    fn minute_boundary_59_seconds_adds_nothing() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 0)).unwrap();

        let outcome = tracker
            .handle_disconnect_at(&disconnect("uid=a"), 59)
            .unwrap();
        assert_eq!(
            outcome,
            DisconnectOutcome::Recorded {
                minutes: 0,
                total: 0
            }
        );
    }

    #[test]
    fn minute_boundary_60_seconds_adds_one() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 0)).unwrap();

        let outcome = tracker
            .handle_disconnect_at(&disconnect("uid=a"), 60)
            .unwrap();
        assert_eq!(
            outcome,
            DisconnectOutcome::Recorded {
                minutes: 1,
                total: 1
            }
        );
    }

    #[test]
    fn duplicate_disconnect_does_not_double_count() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 0)).unwrap();
        tracker
            .handle_disconnect_at(&disconnect("uid=a"), 125)
            .unwrap();

        let replayed = tracker
            .handle_disconnect_at(&disconnect("uid=a"), 125)
            .unwrap();
        assert_eq!(replayed, DisconnectOutcome::SessionNotOpen);

        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.time_spent, Some(2));
    }

    #[test]
    fn disconnect_for_unknown_identity_is_a_noop() {
        let tracker = tracker();
        let outcome = tracker
            .handle_disconnect_at(&disconnect("uid=ghost"), 125)
            .unwrap();
        assert_eq!(outcome, DisconnectOutcome::UnknownIdentity);
        assert_eq!(tracker.store().count().unwrap(), 0);
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let tracker = tracker();
        tracker.handle_connect(&connect("uid=a", 10_000)).unwrap();

        let outcome = tracker
            .handle_disconnect_at(&disconnect("uid=a"), 1_000)
            .unwrap();
        assert_eq!(
            outcome,
            DisconnectOutcome::Recorded {
                minutes: 0,
                total: 0
            }
        );
    }

    #[test]
    fn full_session_scenario() {
        let tracker = tracker();

        // Connect at t=0 with no prior record.
        tracker.handle_connect(&connect("uid=a", 0)).unwrap();
        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.time_spent, None);

        // Disconnect at t=125 -> 2 minutes.
        tracker
            .handle_disconnect_at(&disconnect("uid=a"), 125)
            .unwrap();
        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.time_spent, Some(2));

        // Reconnect at t=200: last_connected moves, time_spent stays.
        tracker.handle_connect(&connect("uid=a", 200)).unwrap();
        let row = tracker.store().find_by_unique_id("uid=a").unwrap().unwrap();
        assert_eq!(row.last_connected, 200);
        assert_eq!(row.time_spent, Some(2));

        // Disconnect at t=260 -> 2 + floor(60/60) = 3.
        let outcome = tracker
            .handle_disconnect_at(&disconnect("uid=a"), 260)
            .unwrap();
        assert_eq!(
            outcome,
            DisconnectOutcome::Recorded {
                minutes: 1,
                total: 3
            }
        );
    }

    #[test]
    fn event_dispatch() {
        let tracker = tracker();
        tracker
            .handle_event(&PresenceEvent::Connect {
                client: connect("uid=a", 0),
            })
            .unwrap();
        assert_eq!(tracker.store().count().unwrap(), 1);

        // Disconnect dispatch for an unknown identity completes without error.
        tracker
            .handle_event(&PresenceEvent::Disconnect {
                client: disconnect("uid=ghost"),
            })
            .unwrap();
        assert_eq!(tracker.store().count().unwrap(), 1);
    }
}
