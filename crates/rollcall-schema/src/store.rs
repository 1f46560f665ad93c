//! The schema store seam.

use std::collections::HashMap;

use rollcall_types::{EventCustomData, EventId, EventTypeId, EventTypeSchema};
use serde::{Deserialize, Serialize};

use crate::SchemaStoreError;

/// Whether an upsert created a new document or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertAction {
    Created,
    Updated,
}

/// Document storage for type schemas and per-event custom values.
pub trait SchemaStore: Send + Sync {
    /// Writes (or replaces) the schema document for `schema.type_id`.
    fn put_event_type(&self, schema: &EventTypeSchema) -> Result<(), SchemaStoreError>;

    /// Reads one type's schema document.
    fn event_type(&self, type_id: EventTypeId)
        -> Result<Option<EventTypeSchema>, SchemaStoreError>;

    /// Reads every schema document, ordered by type id.
    fn event_types(&self) -> Result<Vec<EventTypeSchema>, SchemaStoreError>;

    /// Reads one event's custom data document.
    fn custom_data(&self, event_id: EventId)
        -> Result<Option<EventCustomData>, SchemaStoreError>;

    /// Reads the custom data documents of several events in one call.
    /// Events without a document are absent from the result.
    fn custom_data_many(
        &self,
        event_ids: &[EventId],
    ) -> Result<HashMap<EventId, EventCustomData>, SchemaStoreError>;

    /// Creates the event's document if absent, otherwise replaces it.
    fn upsert_custom_data(&self, data: &EventCustomData)
        -> Result<UpsertAction, SchemaStoreError>;

    /// Verifies the store is reachable.
    fn ping(&self) -> Result<(), SchemaStoreError>;
}
