//! Identity repository — CRUD for the `identities` table.
//!
//! One row per unique identifier. `nickname`, `created`, and `database_id`
//! are written once at creation and never touched by connect updates;
//! nickname drift across reconnects is not tracked.

use rusqlite::{Connection, OptionalExtension, Row, params};

use roster_core::{ClientIdentity, ConnectNotice};

use crate::errors::Result;

fn map_identity(row: &Row<'_>) -> rusqlite::Result<ClientIdentity> {
    Ok(ClientIdentity {
        unique_id: row.get(0)?,
        nickname: row.get(1)?,
        database_id: row.get(2)?,
        created: row.get(3)?,
        last_connected: row.get(4)?,
        ip_address: row.get(5)?,
        platform: row.get(6)?,
        country: row.get(7)?,
        time_spent: row.get(8)?,
        session_open: row.get(9)?,
    })
}

const IDENTITY_COLUMNS: &str = "unique_id, nickname, database_id, created, last_connected,
     ip_address, platform, country, time_spent, session_open";

/// Identity repository — stateless, every method takes `&Connection`.
pub struct IdentityRepo;

impl IdentityRepo {
    /// Create a new identity from a connect notice.
    ///
    /// The row starts with `time_spent` NULL (no completed session yet) and
    /// an open session. Fails if the unique identifier already exists.
    pub fn create(conn: &Connection, notice: &ConnectNotice) -> Result<ClientIdentity> {
        let _ = conn.execute(
            "INSERT INTO identities (unique_id, nickname, database_id, created,
                 last_connected, ip_address, platform, country, session_open)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
            params![
                notice.unique_id,
                notice.nickname,
                notice.database_id,
                notice.created,
                notice.last_connected,
                notice.ip_address,
                notice.platform,
                notice.country,
            ],
        )?;
        Ok(ClientIdentity {
            unique_id: notice.unique_id.clone(),
            nickname: notice.nickname.clone(),
            database_id: notice.database_id,
            created: notice.created,
            last_connected: notice.last_connected,
            ip_address: notice.ip_address.clone(),
            platform: notice.platform.clone(),
            country: notice.country.clone(),
            time_spent: None,
            session_open: true,
        })
    }

    /// Get an identity by its unique identifier.
    pub fn get_by_unique_id(conn: &Connection, unique_id: &str) -> Result<Option<ClientIdentity>> {
        let row = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE unique_id = ?1"),
                params![unique_id],
                map_identity,
            )
            .optional()?;
        Ok(row)
    }

    /// Record a reconnect for an existing identity.
    ///
    /// Overwrites only the transient contact fields (`last_connected`,
    /// `ip_address`, `platform`, `country`) and reopens the session; the
    /// identity facts fixed at creation stay untouched. Safe under replay.
    /// Returns `false` if no such identity exists.
    pub fn record_connect(conn: &Connection, notice: &ConnectNotice) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE identities
                SET last_connected = ?1, ip_address = ?2, platform = ?3,
                    country = ?4, session_open = 1
              WHERE unique_id = ?5",
            params![
                notice.last_connected,
                notice.ip_address,
                notice.platform,
                notice.country,
                notice.unique_id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Close the open session for `unique_id`, accumulating elapsed whole
    /// minutes as of `now_secs`.
    ///
    /// The accumulation runs in a single statement guarded by
    /// `session_open = 1`: integer division floors the minute count, the
    /// `MAX` clamps negative elapsed (clock skew) to zero, and a replayed
    /// disconnect matches zero rows instead of double counting.
    /// Returns `false` if no open session matched.
    pub fn close_session(conn: &Connection, unique_id: &str, now_secs: i64) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE identities
                SET time_spent = COALESCE(time_spent, 0)
                        + MAX(0, (?1 - last_connected) / 60),
                    session_open = 0
              WHERE unique_id = ?2 AND session_open = 1",
            params![now_secs, unique_id],
        )?;
        Ok(changed > 0)
    }

    /// List all identities, most recently connected first.
    pub fn list(conn: &Connection) -> Result<Vec<ClientIdentity>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities ORDER BY last_connected DESC"
        ))?;
        let rows = stmt
            .query_map([], map_identity)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count stored identities.
    pub fn count(conn: &Connection) -> Result<i64> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Check whether an identity exists.
    pub fn exists(conn: &Connection, unique_id: &str) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM identities WHERE unique_id = ?1)",
            params![unique_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
