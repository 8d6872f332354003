//! Schema migrations, gated by `PRAGMA user_version`.
//!
//! Each entry in [`MIGRATIONS`] is applied at most once; the user version
//! records how many have run. Migrations are append-only.

use rusqlite::Connection;
use tracing::debug;

use crate::errors::Result;

/// Ordered list of schema migrations.
const MIGRATIONS: &[&str] = &[
    // v1: the identities table.
    //
    // `time_spent` is NULL until the first completed session.
    // `session_open` is the explicit open-session marker that makes
    // duplicate disconnects a no-op.
    "CREATE TABLE identities (
        unique_id      TEXT PRIMARY KEY,
        nickname       TEXT NOT NULL,
        database_id    INTEGER NOT NULL,
        created        INTEGER NOT NULL,
        last_connected INTEGER NOT NULL,
        ip_address     TEXT,
        platform       TEXT,
        country        TEXT,
        time_spent     INTEGER,
        session_open   INTEGER NOT NULL DEFAULT 0
    );
    CREATE INDEX idx_identities_last_connected
        ON identities (last_connected DESC);",
];

/// Apply all pending migrations to `conn`.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for (index, migration) in MIGRATIONS.iter().enumerate().skip(version as usize) {
        conn.execute_batch(migration)?;
        conn.pragma_update(None, "user_version", index as i64 + 1)?;
        debug!(version = index + 1, "applied schema migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_on_fresh_database() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);

        // The identities table exists and is empty.
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM identities", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);
    }
}
