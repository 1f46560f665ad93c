//! Error taxonomy for attendance operations.

use std::fmt;

use rollcall_live::LiveStateError;
use rollcall_registry::RegistryError;
use rollcall_schema::{SchemaStoreError, SchemaViolation};
use rollcall_types::{EventId, EventTypeId, ParticipantId, PlaceId};
use serde::Serialize;
use thiserror::Error;

/// One of the three backing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Durable relational registry.
    Registry,
    /// Ephemeral check-in state.
    LiveState,
    /// Type schemas and per-event custom values.
    SchemaStore,
}

impl StoreKind {
    /// Returns the label used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registry => "registry",
            Self::LiveState => "live_state",
            Self::SchemaStore => "schema_store",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    #[error("event {0} not found")]
    Event(EventId),

    #[error("participant {participant} is not registered for event {event}")]
    Registration {
        event: EventId,
        participant: ParticipantId,
    },

    #[error("event type {0} not found")]
    EventType(EventTypeId),

    #[error("place {0} not found")]
    Place(PlaceId),

    #[error("no custom field schema stored for event type {0}")]
    EventTypeSchema(EventTypeId),
}

/// Input rejected before any store was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error("event {0} has already been finalized")]
    EventFinalized(EventId),
}

/// Errors returned by attendance operations.
#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error(transparent)]
    NotFound(#[from] Missing),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A store could not be reached or a read against it failed.
    #[error("{store} unavailable: {reason}")]
    StoreUnavailable { store: StoreKind, reason: String },

    /// A registry write or transaction did not commit.
    #[error("durable write failed: {0}")]
    DurableWriteFailure(String),
}

impl AttendanceError {
    /// Returns `true` if repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::DurableWriteFailure(_)
        )
    }

    pub(crate) fn unavailable(store: StoreKind, reason: impl fmt::Display) -> Self {
        Self::StoreUnavailable {
            store,
            reason: reason.to_string(),
        }
    }

    /// Maps a failed registry write.
    pub(crate) fn durable(err: impl fmt::Display) -> Self {
        Self::DurableWriteFailure(err.to_string())
    }
}

impl From<SchemaViolation> for AttendanceError {
    fn from(err: SchemaViolation) -> Self {
        Self::Validation(ValidationError::Schema(err))
    }
}

// Registry reads. Writes go through `AttendanceError::durable` explicitly.
impl From<RegistryError> for AttendanceError {
    fn from(err: RegistryError) -> Self {
        Self::unavailable(StoreKind::Registry, err)
    }
}

// The registry pool is the only r2d2 pool the attendance layer checks out
// from directly; the other stores wrap theirs.
impl From<r2d2::Error> for AttendanceError {
    fn from(err: r2d2::Error) -> Self {
        Self::unavailable(StoreKind::Registry, err)
    }
}

impl From<LiveStateError> for AttendanceError {
    fn from(err: LiveStateError) -> Self {
        Self::unavailable(StoreKind::LiveState, err)
    }
}

impl From<SchemaStoreError> for AttendanceError {
    fn from(err: SchemaStoreError) -> Self {
        Self::unavailable(StoreKind::SchemaStore, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(AttendanceError::unavailable(StoreKind::LiveState, "refused").is_retryable());
        assert!(AttendanceError::durable("disk I/O error").is_retryable());
        assert!(!AttendanceError::from(Missing::Event(EventId(9))).is_retryable());
        assert!(!AttendanceError::from(ValidationError::EmptyName).is_retryable());
    }

    #[test]
    fn messages_name_the_store_and_entity() {
        let err = AttendanceError::unavailable(StoreKind::LiveState, "connection refused");
        assert_eq!(err.to_string(), "live_state unavailable: connection refused");

        let err = AttendanceError::from(Missing::Registration {
            event: EventId(42),
            participant: ParticipantId(7),
        });
        assert_eq!(
            err.to_string(),
            "participant 7 is not registered for event 42"
        );
    }

    #[test]
    fn schema_violation_becomes_validation_error() {
        let err = AttendanceError::from(SchemaViolation::EmptyFieldList);
        assert!(matches!(
            err,
            AttendanceError::Validation(ValidationError::Schema(SchemaViolation::EmptyFieldList))
        ));
    }
}
