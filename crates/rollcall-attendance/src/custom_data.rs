//! Event types, event creation and per-event custom values.

use rollcall_registry::{
    event_type_exists, get_event, insert_event, insert_event_type, place_exists, Event, NewEvent,
};
use rollcall_schema::{validate_custom_values, validate_field_definitions, UpsertAction};
use rollcall_types::{
    CustomValues, EventCustomData, EventId, EventTypeId, EventTypeSchema, FieldDefinition, PlaceId,
};
use serde::{Deserialize, Serialize};

use crate::context::StoreContext;
use crate::error::{AttendanceError, Missing, StoreKind, ValidationError};

/// Request to create an event, optionally with initial custom values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewEventRequest {
    pub name: String,
    pub event_type_id: EventTypeId,
    pub place_id: PlaceId,
    #[serde(default)]
    pub start_date_time: Option<String>,
    #[serde(default)]
    pub end_date_time: Option<String>,
    #[serde(default)]
    pub custom_values: Option<CustomValues>,
}

/// A newly created event and the custom data stored with it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedEvent {
    pub event: Event,
    pub custom_data: Option<EventCustomData>,
}

/// Manages event types and enforces their custom field schemas.
#[derive(Debug, Clone)]
pub struct CustomDataValidator {
    ctx: StoreContext,
}

fn require_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

impl CustomDataValidator {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    fn require_schema(&self, type_id: EventTypeId) -> Result<EventTypeSchema, AttendanceError> {
        self.ctx
            .schema
            .event_type(type_id)?
            .ok_or_else(|| Missing::EventTypeSchema(type_id).into())
    }

    /// Creates an event type: a catalog row in the registry, then its
    /// schema document.
    ///
    /// The two writes are not atomic. If the schema document cannot be
    /// written the registry row stays behind and the error is logged with
    /// its id.
    pub fn define_event_type(
        &self,
        name: &str,
        custom_fields: Vec<FieldDefinition>,
    ) -> Result<EventTypeSchema, AttendanceError> {
        require_name(name)?;
        validate_field_definitions(&custom_fields)?;

        let type_id = self.ctx.with_registry(|conn| {
            insert_event_type(conn, name.trim()).map_err(AttendanceError::durable)
        })?;

        let schema = EventTypeSchema {
            type_id,
            name: name.trim().to_string(),
            custom_fields,
        };
        if let Err(e) = self.ctx.schema.put_event_type(&schema) {
            tracing::error!(
                type_id = %type_id,
                error = %e,
                "schema document write failed, registry row left without a schema"
            );
            return Err(AttendanceError::unavailable(StoreKind::SchemaStore, e));
        }

        tracing::info!(
            type_id = %type_id,
            name = %schema.name,
            fields = schema.custom_fields.len(),
            "event type defined"
        );
        Ok(schema)
    }

    /// Creates an event. Custom values, when given, are checked against the
    /// type's schema before anything is written.
    pub fn create_event(&self, request: NewEventRequest) -> Result<CreatedEvent, AttendanceError> {
        require_name(&request.name)?;

        self.ctx.with_registry(|conn| {
            if !event_type_exists(conn, request.event_type_id)? {
                return Err(Missing::EventType(request.event_type_id).into());
            }
            if !place_exists(conn, request.place_id)? {
                return Err(Missing::Place(request.place_id).into());
            }
            Ok(())
        })?;

        let custom_values = request.custom_values.filter(|values| !values.is_empty());
        if let Some(values) = &custom_values {
            let schema = self.require_schema(request.event_type_id)?;
            validate_custom_values(&schema, values)?;
        }

        let new_event = NewEvent {
            name: request.name.trim().to_string(),
            event_type_id: request.event_type_id,
            place_id: request.place_id,
            start_date_time: request.start_date_time,
            end_date_time: request.end_date_time,
        };
        let event = self.ctx.with_registry(|conn| {
            let event_id = insert_event(conn, &new_event).map_err(AttendanceError::durable)?;
            get_event(conn, event_id)?.ok_or_else(|| Missing::Event(event_id).into())
        })?;
        tracing::info!(event_id = %event.id, type_id = %event.event_type_id, "event created");

        let custom_data = match custom_values {
            Some(values) => {
                let data = EventCustomData {
                    event_id: event.id,
                    type_id: event.event_type_id,
                    custom_field_values: values,
                };
                if let Err(e) = self.ctx.schema.upsert_custom_data(&data) {
                    tracing::error!(
                        event_id = %event.id,
                        error = %e,
                        "custom data write failed after event row was created"
                    );
                    return Err(AttendanceError::unavailable(StoreKind::SchemaStore, e));
                }
                Some(data)
            }
            None => None,
        };

        Ok(CreatedEvent { event, custom_data })
    }

    /// Replaces an event's custom values after checking them against its
    /// type's schema.
    pub fn set_custom_data(
        &self,
        event_id: EventId,
        values: CustomValues,
    ) -> Result<UpsertAction, AttendanceError> {
        let event = self.ctx.with_registry(|conn| {
            get_event(conn, event_id)?.ok_or_else(|| Missing::Event(event_id).into())
        })?;

        let schema = self.require_schema(event.event_type_id)?;
        validate_custom_values(&schema, &values)?;

        let action = self.ctx.schema.upsert_custom_data(&EventCustomData {
            event_id,
            type_id: event.event_type_id,
            custom_field_values: values,
        })?;
        tracing::info!(event_id = %event_id, ?action, "custom data stored");
        Ok(action)
    }

    /// Reads one event type's schema.
    pub fn event_type(&self, type_id: EventTypeId) -> Result<EventTypeSchema, AttendanceError> {
        self.require_schema(type_id)
    }

    /// Reads every stored event type schema, ordered by type id.
    pub fn event_types(&self) -> Result<Vec<EventTypeSchema>, AttendanceError> {
        Ok(self.ctx.schema.event_types()?)
    }
}
