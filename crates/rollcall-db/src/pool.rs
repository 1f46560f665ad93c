//! Blocking SQLite pools for the registry and the schema document store.
//!
//! Callers check a connection out, run their statements, and drop it. A
//! checkout waits at most [`DbRuntimeSettings::connection_timeout_ms`]
//! before failing, so an exhausted pool surfaces as an error instead of a
//! hang.

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Runtime tunables for a SQLite pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long SQLite retries a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Maximum number of pooled connections.
    pub pool_max_size: u32,
    /// How long a checkout waits for a free connection, in milliseconds.
    pub connection_timeout_ms: u64,
}

impl DbRuntimeSettings {
    fn checkout_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
            connection_timeout_ms: 5_000,
        }
    }
}

/// Pool of SQLite connections.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Errors from building a pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

fn pragma_failure(message: String) -> rusqlite::Error {
    rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
        Some(message),
    )
}

/// Puts a fresh connection into WAL mode with foreign keys enforced.
fn configure_connection(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    if !journal_mode.eq_ignore_ascii_case("wal") {
        return Err(pragma_failure(format!(
            "registry file refused WAL journal mode (got {journal_mode})"
        )));
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
}

/// Opens a pool over the SQLite file at `db_path`, creating it if needed.
///
/// Every connection the pool opens runs in WAL mode with foreign keys on
/// and the configured busy timeout. `db_path` must be a file; in-memory
/// databases are private to one connection and are rejected by the WAL
/// check.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the file cannot be opened or a
/// connection cannot be configured.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_flags(
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )
        .with_init(move |conn| configure_connection(conn, settings.busy_timeout_ms));

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .connection_timeout(settings.checkout_timeout())
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        connection_timeout_ms = settings.connection_timeout_ms,
        "sqlite pool created"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_in(dir: &tempfile::TempDir, settings: DbRuntimeSettings) -> DbPool {
        let path = dir.path().join("registry.db");
        create_pool(path.to_str().expect("utf-8 path"), settings)
            .expect("pool creation should succeed")
    }

    #[test]
    fn connections_carry_configured_pragmas() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = pool_in(
            &dir,
            DbRuntimeSettings {
                busy_timeout_ms: 2_500,
                pool_max_size: 3,
                connection_timeout_ms: 750,
            },
        );
        let conn = pool.get().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert_eq!(mode, "wal");

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1, "foreign keys should be enabled");

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500);

        assert_eq!(pool.max_size(), 3);
        assert_eq!(pool.connection_timeout(), Duration::from_millis(750));
    }

    #[test]
    fn exhausted_pool_times_out_instead_of_blocking() {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let pool = pool_in(
            &dir,
            DbRuntimeSettings {
                pool_max_size: 1,
                connection_timeout_ms: 50,
                ..DbRuntimeSettings::default()
            },
        );

        let held = pool.get().expect("first checkout");
        assert!(pool.get().is_err(), "second checkout should time out");
        drop(held);
        assert!(pool.get().is_ok(), "released connection is reusable");
    }
}
