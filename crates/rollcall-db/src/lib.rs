//! SQLite plumbing shared by the registry and the schema store.
//!
//! Provides connection pooling (via `r2d2`), WAL-mode initialization and an
//! embedded, versioned migration runner. The registry's own table layout
//! ships with this crate as [`REGISTRY_MIGRATIONS`]; other SQLite-backed
//! stores bring their own migration list and run it through
//! [`apply_migrations`].
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: concurrent readers with a single writer,
//!   which matches attendance traffic (many lookups, one finalize at a time
//!   per event).
//! - **`r2d2` connection pool**: a bounded, blocking pool. Callers check a
//!   connection out for the duration of one validation or one transaction.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`.

mod migrations;
mod pool;

pub use migrations::{apply_migrations, run_migrations, Migration, MigrationError, REGISTRY_MIGRATIONS};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
