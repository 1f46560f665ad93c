//! Shared identifiers and document types for the Rollcall workspace.
//!
//! Every crate that touches attendance data speaks in terms of the types
//! defined here: the integer identifiers handed out by the registry, the
//! custom-field definitions stored per event type, and the per-event
//! custom-value documents.
//!
//! Nothing in this crate performs I/O. Storage crates depend on it, never
//! the other way round.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

macro_rules! registry_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw registry row id.
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

registry_id!(
    /// Identity of an event row in the registry.
    EventId
);
registry_id!(
    /// Identity of a participant (a person who can register for events).
    ParticipantId
);
registry_id!(
    /// Identity of an event type in the registry catalog.
    EventTypeId
);
registry_id!(
    /// Identity of a place where events are held.
    PlaceId
);
registry_id!(
    /// Identity of a (participant, event) registration link.
    RegistrationId
);

/// Free-form custom field values attached to a single event.
pub type CustomValues = serde_json::Map<String, serde_json::Value>;

/// Declared type of a custom field.
///
/// Stored and exchanged as the lowercase strings `text`, `number` and
/// `boolean`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// A JSON string.
    Text,
    /// A JSON number (integer or float).
    Number,
    /// A JSON boolean.
    Boolean,
}

impl FieldType {
    /// Returns the wire label for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Returns `true` if `value` structurally conforms to this type.
    pub fn accepts(self, value: &serde_json::Value) -> bool {
        match self {
            Self::Text => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`FieldType`] label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field type: {0}")]
pub struct ParseFieldTypeError(pub String);

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            other => Err(ParseFieldTypeError(other.to_string())),
        }
    }
}

/// Describes the JSON kind of a value, for validation messages.
pub fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "text",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// One custom field declared by an event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name, unique within its event type.
    pub field_name: String,
    /// Declared value type.
    pub data_type: FieldType,
}

impl FieldDefinition {
    /// Convenience constructor.
    pub fn new(field_name: impl Into<String>, data_type: FieldType) -> Self {
        Self {
            field_name: field_name.into(),
            data_type,
        }
    }
}

/// Custom-field schema of one event type, as held by the schema store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeSchema {
    /// Registry identity of the type.
    pub type_id: EventTypeId,
    /// Display name of the type.
    pub name: String,
    /// Ordered field definitions.
    pub custom_fields: Vec<FieldDefinition>,
}

impl EventTypeSchema {
    /// Looks up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.custom_fields.iter().find(|f| f.field_name == name)
    }

    /// Returns the declared field names in schema order.
    pub fn field_names(&self) -> Vec<String> {
        self.custom_fields
            .iter()
            .map(|f| f.field_name.clone())
            .collect()
    }
}

/// Custom field values stored for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCustomData {
    /// Event the values belong to.
    pub event_id: EventId,
    /// Type the values were validated against.
    pub type_id: EventTypeId,
    /// Field name to value.
    pub custom_field_values: CustomValues,
}

/// Attendance lifecycle of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// No live keys exist and the event has not been finalized.
    NotStarted,
    /// Live keys exist; check-in and check-out are permitted.
    Active,
    /// Attendance has been reconciled into the registry.
    Finalized,
}
