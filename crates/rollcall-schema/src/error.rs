//! Error types for the schema store.

/// Errors that can occur during schema store operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaStoreError {
    /// No connection could be checked out of the pool.
    #[error("schema store pool unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    /// A database operation failed.
    #[error("schema store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A document could not be encoded or decoded.
    #[error("schema store document error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document tables could not be created.
    #[error("schema store migration failed: {0}")]
    Migration(#[from] rollcall_db::MigrationError),

    /// The in-process backend's lock was poisoned by a panicking writer.
    #[error("schema store lock poisoned")]
    Poisoned,
}
