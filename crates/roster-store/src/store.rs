//! High-level [`IdentityStore`] API.
//!
//! Composes repository operations into per-identifier atomic methods.
//! Writers for the same unique identifier are serialized through an
//! in-process lock map, and busy/locked SQLite errors retry with linear
//! backoff plus jitter, so rapid reconnects and duplicate disconnects for
//! one identifier cannot interleave mid-operation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::debug;

use roster_core::{ClientIdentity, ConnectNotice};

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repository::IdentityRepo;

/// Outcome of applying a connect notice.
#[derive(Debug)]
pub enum ConnectApplied {
    /// First-ever connect: a new identity was created.
    Created(ClientIdentity),
    /// Known identity: contact fields were refreshed and the session
    /// reopened.
    Updated,
}

/// Outcome of closing a session.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionClosed {
    /// An open session was closed and its duration recorded.
    Recorded {
        /// Whole minutes added by this session.
        minutes: i64,
        /// Cumulative minutes after the update.
        total: i64,
    },
    /// The identity exists but has no open session (stale or replayed
    /// disconnect).
    NotOpen,
    /// No identity is stored for this unique identifier.
    Unknown,
}

/// Identity store wrapping a connection pool and the identity repository.
///
/// INVARIANT: writes for one unique identifier are serialized via the
/// in-process lock map; the `session_open` guard in the close statement
/// enforces the same idempotence at the SQL level for any writer outside
/// this process.
pub struct IdentityStore {
    pool: ConnectionPool,
    write_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl IdentityStore {
    const BUSY_MAX_RETRIES: u32 = 32;

    /// Create a store over an existing pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Open (or create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ConnectionPool::open(path)?))
    }

    /// Open an in-memory store, for tests.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(ConnectionPool::in_memory()?))
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    fn acquire_write_lock(&self, unique_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .write_locks
            .lock()
            .map_err(|_| StoreError::Internal("identity lock map poisoned".into()))?;

        // Opportunistically prune dead weak refs when the map grows.
        if locks.len() > 128 {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        if let Some(existing) = locks.get(unique_id).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        let lock = Arc::new(Mutex::new(()));
        let _ = locks.insert(unique_id.to_string(), Arc::downgrade(&lock));
        Ok(lock)
    }

    fn with_write_lock<T>(&self, unique_id: &str, f: impl FnMut() -> Result<T>) -> Result<T> {
        let lock = self.acquire_write_lock(unique_id)?;
        let _guard = lock
            .lock()
            .map_err(|_| StoreError::Internal("identity write lock poisoned".into()))?;
        Self::retry_on_sqlite_busy(f)
    }

    /// Retry an operation on SQLite BUSY/LOCKED with linear backoff + jitter.
    fn retry_on_sqlite_busy<T>(mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts = 0;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err)
                    if Self::is_sqlite_busy_or_locked(&err)
                        && attempts < Self::BUSY_MAX_RETRIES =>
                {
                    attempts += 1;
                    let base_ms = u64::from(attempts).saturating_mul(10).min(500);
                    let jitter_range = base_ms / 4;
                    let jitter = if jitter_range > 0 {
                        rand::random::<u64>() % (jitter_range * 2 + 1)
                    } else {
                        0
                    };
                    let backoff_ms = base_ms.saturating_sub(jitter_range) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_sqlite_busy_or_locked(err: &StoreError) -> bool {
        match err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => {
                matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
            }
            _ => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────

    /// Look up an identity by unique identifier.
    ///
    /// Read only; safe to call concurrently with event processing. Reads
    /// reflect whatever state is committed at lookup time.
    pub fn find_by_unique_id(&self, unique_id: &str) -> Result<Option<ClientIdentity>> {
        IdentityRepo::get_by_unique_id(&*self.conn()?, unique_id)
    }

    /// All stored identities, most recently connected first.
    pub fn all_identities(&self) -> Result<Vec<ClientIdentity>> {
        IdentityRepo::list(&*self.conn()?)
    }

    /// Number of stored identities.
    pub fn count(&self) -> Result<i64> {
        IdentityRepo::count(&*self.conn()?)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────

    /// Apply a connect notice: refresh the contact fields of a known
    /// identity, or create a new one on first-ever connect.
    ///
    /// Replay-safe: a repeated connect only overwrites transient fields.
    pub fn apply_connect(&self, notice: &ConnectNotice) -> Result<ConnectApplied> {
        self.with_write_lock(&notice.unique_id, || {
            let conn = self.conn()?;
            if IdentityRepo::record_connect(&conn, notice)? {
                return Ok(ConnectApplied::Updated);
            }
            let identity = IdentityRepo::create(&conn, notice)?;
            Ok(ConnectApplied::Created(identity))
        })
    }

    /// Close the open session for `unique_id` as of `now_secs`, accumulating
    /// elapsed whole minutes into `time_spent`.
    ///
    /// Replayed or stale disconnects resolve to [`SessionClosed::NotOpen`];
    /// a disconnect with no stored identity resolves to
    /// [`SessionClosed::Unknown`]. Neither mutates anything.
    pub fn close_session(&self, unique_id: &str, now_secs: i64) -> Result<SessionClosed> {
        self.with_write_lock(unique_id, || {
            let conn = self.conn()?;
            let Some(identity) = IdentityRepo::get_by_unique_id(&conn, unique_id)? else {
                return Ok(SessionClosed::Unknown);
            };
            if !identity.session_open {
                return Ok(SessionClosed::NotOpen);
            }

            let minutes = ((now_secs - identity.last_connected) / 60).max(0);
            if !IdentityRepo::close_session(&conn, unique_id, now_secs)? {
                // Lost to an external writer between read and update.
                debug!(unique_id, "session already closed by another writer");
                return Ok(SessionClosed::NotOpen);
            }

            Ok(SessionClosed::Recorded {
                minutes,
                total: identity.minutes_spent() + minutes,
            })
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
