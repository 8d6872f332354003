//! r2d2 connection pool over rusqlite.
//!
//! Every connection gets the same pragmas (WAL, foreign keys, busy timeout).
//! Pool checkout has a bounded wait so callers never block indefinitely on a
//! starved pool.

use std::path::Path;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::errors::Result;
use crate::sqlite::migrations::run_migrations;

/// A connection checked out of the pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_MAX_SIZE: u32 = 8;
const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(5);
const PRAGMAS: &str = "PRAGMA journal_mode = WAL;
     PRAGMA foreign_keys = ON;
     PRAGMA synchronous = NORMAL;
     PRAGMA busy_timeout = 5000;";

/// Pooled SQLite connections with migrations applied.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl ConnectionPool {
    /// Open (or create) the database at `path` and run pending migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let manager =
            SqliteConnectionManager::file(path).with_init(|conn| conn.execute_batch(PRAGMAS));
        let pool = Self::build(manager)?;
        info!(path = %path.display(), "identity store opened");
        Ok(pool)
    }

    /// Open an in-memory database, for tests.
    ///
    /// The pool is capped at one connection: separate in-memory connections
    /// would each see their own empty database.
    pub fn in_memory() -> Result<Self> {
        let manager =
            SqliteConnectionManager::memory().with_init(|conn| conn.execute_batch(PRAGMAS));
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .map_err(crate::errors::StoreError::Pool)?;
        let pool = Self { pool };
        run_migrations(&*pool.get()?)?;
        Ok(pool)
    }

    fn build(manager: SqliteConnectionManager) -> Result<Self> {
        let pool = r2d2::Pool::builder()
            .max_size(POOL_MAX_SIZE)
            .connection_timeout(CHECKOUT_TIMEOUT)
            .build(manager)
            .map_err(crate::errors::StoreError::Pool)?;
        let pool = Self { pool };
        run_migrations(&*pool.get()?)?;
        Ok(pool)
    }

    /// Check a connection out of the pool (bounded wait).
    pub fn get(&self) -> std::result::Result<PooledConnection, r2d2::Error> {
        self.pool.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_pool_is_migrated() {
        let pool = ConnectionPool::in_memory().unwrap();
        let conn = pool.get().unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert!(version > 0);
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.db");
        let pool = ConnectionPool::open(&path).unwrap();
        drop(pool.get().unwrap());
        assert!(path.exists());
    }

    #[test]
    fn reopen_preserves_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.db");
        drop(ConnectionPool::open(&path).unwrap());

        let pool = ConnectionPool::open(&path).unwrap();
        let conn = pool.get().unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert!(version > 0);
    }
}
