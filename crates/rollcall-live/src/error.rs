//! Error types for the live state store.

/// Errors that can occur while talking to the live state store.
#[derive(Debug, thiserror::Error)]
pub enum LiveStateError {
    /// No connection could be checked out of the pool.
    #[error("live state pool unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    /// A command failed on the server or the connection dropped.
    #[error("live state command failed: {0}")]
    Command(#[from] redis::RedisError),

    /// The in-process backend's lock was poisoned by a panicking writer.
    #[error("live state lock poisoned")]
    Poisoned,
}
