//! Schema conformance checks.
//!
//! Both checks are pure: they run before any store write so that a
//! rejected request has no side effects.

use std::collections::HashSet;

use rollcall_types::{json_kind, CustomValues, EventTypeSchema, FieldDefinition, FieldType};
use thiserror::Error;

/// Ways a field list or a value map can fail to conform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("at least one custom field definition is required")]
    EmptyFieldList,

    #[error("custom field names must not be empty")]
    EmptyFieldName,

    #[error("custom field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("custom field '{field}' is not defined in the event type schema (valid fields: {})", allowed.join(", "))]
    UnknownField { field: String, allowed: Vec<String> },

    #[error("field '{field}' must be {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },
}

/// Checks a new type's field list: non-empty, with unique non-empty names.
pub fn validate_field_definitions(fields: &[FieldDefinition]) -> Result<(), SchemaViolation> {
    if fields.is_empty() {
        return Err(SchemaViolation::EmptyFieldList);
    }

    let mut seen = HashSet::new();
    for field in fields {
        if field.field_name.trim().is_empty() {
            return Err(SchemaViolation::EmptyFieldName);
        }
        if !seen.insert(field.field_name.as_str()) {
            return Err(SchemaViolation::DuplicateField(field.field_name.clone()));
        }
    }
    Ok(())
}

/// Checks that every key of `values` is declared by `schema` and that each
/// value has the declared JSON kind.
///
/// Values are checked in key order so the reported violation is stable.
/// Declared fields that are absent from `values` are allowed.
pub fn validate_custom_values(
    schema: &EventTypeSchema,
    values: &CustomValues,
) -> Result<(), SchemaViolation> {
    let mut keys: Vec<&String> = values.keys().collect();
    keys.sort();

    for key in keys {
        let Some(definition) = schema.field(key) else {
            return Err(SchemaViolation::UnknownField {
                field: key.clone(),
                allowed: schema.field_names(),
            });
        };

        let value = &values[key.as_str()];
        if !definition.data_type.accepts(value) {
            return Err(SchemaViolation::TypeMismatch {
                field: key.clone(),
                expected: definition.data_type,
                found: json_kind(value),
            });
        }
    }
    Ok(())
}
