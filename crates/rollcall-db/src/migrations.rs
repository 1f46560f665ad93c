//! Embedded SQL migration runner.
//!
//! Migrations are SQL files embedded at compile time. They run sequentially
//! on startup, tracked by the `_rollcall_migrations` table. Each migration
//! runs exactly once; applied migrations are skipped.

use rusqlite::Connection;
use thiserror::Error;

/// A single embedded migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Unique, ordered name recorded in the tracking table.
    pub name: &'static str,
    /// SQL batch to execute.
    pub sql: &'static str,
}

/// Registry migrations in order. New migrations are appended here.
pub const REGISTRY_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "000_catalog",
        sql: include_str!("migrations/000_catalog.sql"),
    },
    Migration {
        name: "001_events",
        sql: include_str!("migrations/001_events.sql"),
    },
    Migration {
        name: "002_attendance",
        sql: include_str!("migrations/002_attendance.sql"),
    },
];

/// Errors that can occur during migration execution.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A SQL statement within a migration failed.
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        /// The name of the migration that failed.
        name: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },

    /// Failed to query migration state.
    #[error("failed to check migration state: {0}")]
    StateQuery(rusqlite::Error),
}

/// Runs all pending registry migrations against the given connection.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply_migrations(conn, REGISTRY_MIGRATIONS)
}

/// Applies every migration in `migrations` that has not been recorded yet.
///
/// Each migration and its tracking row are committed in one transaction,
/// so a failing migration leaves no partial schema behind. Returns the
/// number of migrations applied by this call.
///
/// # Errors
///
/// Returns `MigrationError` if any migration fails to execute or if the
/// migration tracking table cannot be queried.
pub fn apply_migrations(
    conn: &Connection,
    migrations: &[Migration],
) -> Result<usize, MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _rollcall_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| MigrationError::ExecutionFailed {
        name: "_rollcall_migrations_bootstrap".to_string(),
        source: e,
    })?;

    let mut applied = 0;

    for migration in migrations {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _rollcall_migrations WHERE name = ?1",
                [migration.name],
                |row| row.get(0),
            )
            .map_err(MigrationError::StateQuery)?;

        if already_applied {
            tracing::debug!(
                migration = migration.name,
                "migration already applied, skipping"
            );
            continue;
        }

        tracing::info!(migration = migration.name, "applying migration");

        let failed = |e| MigrationError::ExecutionFailed {
            name: migration.name.to_string(),
            source: e,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(migration.sql).map_err(failed)?;
        tx.execute(
            "INSERT INTO _rollcall_migrations (name) VALUES (?1)",
            [migration.name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;

        applied += 1;
    }

    Ok(applied)
}
