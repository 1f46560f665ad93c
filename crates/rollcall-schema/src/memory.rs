//! In-process schema store.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use rollcall_types::{EventCustomData, EventId, EventTypeId, EventTypeSchema};

use crate::store::{SchemaStore, UpsertAction};
use crate::SchemaStoreError;

/// Schema store held in memory. Used by tests and throwaway deployments.
#[derive(Debug, Default)]
pub struct MemorySchemaStore {
    types: RwLock<BTreeMap<EventTypeId, EventTypeSchema>>,
    custom: RwLock<HashMap<EventId, EventCustomData>>,
}

impl MemorySchemaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaStore for MemorySchemaStore {
    fn put_event_type(&self, schema: &EventTypeSchema) -> Result<(), SchemaStoreError> {
        let mut types = self.types.write().map_err(|_| SchemaStoreError::Poisoned)?;
        types.insert(schema.type_id, schema.clone());
        Ok(())
    }

    fn event_type(
        &self,
        type_id: EventTypeId,
    ) -> Result<Option<EventTypeSchema>, SchemaStoreError> {
        let types = self.types.read().map_err(|_| SchemaStoreError::Poisoned)?;
        Ok(types.get(&type_id).cloned())
    }

    fn event_types(&self) -> Result<Vec<EventTypeSchema>, SchemaStoreError> {
        let types = self.types.read().map_err(|_| SchemaStoreError::Poisoned)?;
        Ok(types.values().cloned().collect())
    }

    fn custom_data(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventCustomData>, SchemaStoreError> {
        let custom = self.custom.read().map_err(|_| SchemaStoreError::Poisoned)?;
        Ok(custom.get(&event_id).cloned())
    }

    fn custom_data_many(
        &self,
        event_ids: &[EventId],
    ) -> Result<HashMap<EventId, EventCustomData>, SchemaStoreError> {
        let custom = self.custom.read().map_err(|_| SchemaStoreError::Poisoned)?;
        Ok(event_ids
            .iter()
            .filter_map(|id| custom.get(id).map(|data| (*id, data.clone())))
            .collect())
    }

    fn upsert_custom_data(
        &self,
        data: &EventCustomData,
    ) -> Result<UpsertAction, SchemaStoreError> {
        let mut custom = self.custom.write().map_err(|_| SchemaStoreError::Poisoned)?;
        Ok(match custom.insert(data.event_id, data.clone()) {
            Some(_) => UpsertAction::Updated,
            None => UpsertAction::Created,
        })
    }

    fn ping(&self) -> Result<(), SchemaStoreError> {
        Ok(())
    }
}
