//! Per-event-type custom field schemas and per-event custom values.
//!
//! The schema store holds two document collections:
//!
//! - `event_types`: one [`EventTypeSchema`] per type id.
//! - `event_custom_data`: one [`EventCustomData`] per event id.
//!
//! Documents are opaque JSON to the store; conformance of custom values to
//! their type's schema is checked by [`validate_custom_values`] before any
//! write.
//!
//! [`EventTypeSchema`]: rollcall_types::EventTypeSchema
//! [`EventCustomData`]: rollcall_types::EventCustomData

mod document;
mod error;
mod memory;
mod store;
mod validate;

pub use document::{SqliteDocumentStore, SCHEMA_STORE_MIGRATIONS};
pub use error::SchemaStoreError;
pub use memory::MemorySchemaStore;
pub use store::{SchemaStore, UpsertAction};
pub use validate::{validate_custom_values, validate_field_definitions, SchemaViolation};
