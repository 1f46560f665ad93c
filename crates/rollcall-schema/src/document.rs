//! SQLite-backed document store.
//!
//! Runs on its own database file and pool, separate from the registry, so
//! the two fail independently.

use std::collections::HashMap;

use rollcall_db::{apply_migrations, create_pool, DbPool, DbRuntimeSettings, Migration, PoolError};
use rollcall_types::{EventCustomData, EventId, EventTypeId, EventTypeSchema};
use rusqlite::{params, OptionalExtension};

use crate::store::{SchemaStore, UpsertAction};
use crate::SchemaStoreError;

/// Document table migrations, applied by [`SqliteDocumentStore::open`].
pub const SCHEMA_STORE_MIGRATIONS: &[Migration] = &[Migration {
    name: "000_documents",
    sql: include_str!("migrations/000_documents.sql"),
}];

/// Schema store keeping each document as a JSON text column.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    pool: DbPool,
}

impl SqliteDocumentStore {
    /// Opens (creating if needed) the document database at `path` and
    /// applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns `SchemaStoreError::Pool` if the pool cannot be built and
    /// `SchemaStoreError::Migration` if the tables cannot be created.
    pub fn open(path: &str, settings: DbRuntimeSettings) -> Result<Self, SchemaStoreError> {
        let pool = create_pool(path, settings).map_err(|PoolError::PoolInit(e)| e)?;
        {
            let conn = pool.get()?;
            let applied = apply_migrations(&conn, SCHEMA_STORE_MIGRATIONS)?;
            if applied > 0 {
                tracing::info!(count = applied, "applied schema store migrations");
            }
        }
        Ok(Self { pool })
    }
}

impl SchemaStore for SqliteDocumentStore {
    fn put_event_type(&self, schema: &EventTypeSchema) -> Result<(), SchemaStoreError> {
        let document = serde_json::to_string(schema)?;
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO event_types (type_id, document) VALUES (?1, ?2)
             ON CONFLICT(type_id) DO UPDATE SET
                document = excluded.document,
                updated_at = datetime('now')",
            params![schema.type_id.get(), document],
        )?;
        Ok(())
    }

    fn event_type(
        &self,
        type_id: EventTypeId,
    ) -> Result<Option<EventTypeSchema>, SchemaStoreError> {
        let conn = self.pool.get()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM event_types WHERE type_id = ?1",
                [type_id.get()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(document.map(|d| serde_json::from_str(&d)).transpose()?)
    }

    fn event_types(&self) -> Result<Vec<EventTypeSchema>, SchemaStoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT document FROM event_types ORDER BY type_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut schemas = Vec::new();
        for row in rows {
            schemas.push(serde_json::from_str(&row?)?);
        }
        Ok(schemas)
    }

    fn custom_data(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventCustomData>, SchemaStoreError> {
        let conn = self.pool.get()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM event_custom_data WHERE event_id = ?1",
                [event_id.get()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(document.map(|d| serde_json::from_str(&d)).transpose()?)
    }

    fn custom_data_many(
        &self,
        event_ids: &[EventId],
    ) -> Result<HashMap<EventId, EventCustomData>, SchemaStoreError> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = (1..=event_ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT document FROM event_custom_data WHERE event_id IN ({placeholders})"
        );
        let values: Vec<i64> = event_ids.iter().map(|id| id.get()).collect();

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut documents = HashMap::new();
        for row in rows {
            let data: EventCustomData = serde_json::from_str(&row?)?;
            documents.insert(data.event_id, data);
        }
        Ok(documents)
    }

    fn upsert_custom_data(
        &self,
        data: &EventCustomData,
    ) -> Result<UpsertAction, SchemaStoreError> {
        let document = serde_json::to_string(data)?;
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM event_custom_data WHERE event_id = ?1)",
            [data.event_id.get()],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO event_custom_data (event_id, type_id, document) VALUES (?1, ?2, ?3)
             ON CONFLICT(event_id) DO UPDATE SET
                type_id = excluded.type_id,
                document = excluded.document,
                updated_at = datetime('now')",
            params![data.event_id.get(), data.type_id.get(), document],
        )?;
        tx.commit()?;

        Ok(if exists {
            UpsertAction::Updated
        } else {
            UpsertAction::Created
        })
    }

    fn ping(&self) -> Result<(), SchemaStoreError> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_types::{FieldDefinition, FieldType};
    use serde_json::json;

    fn open_store(dir: &tempfile::TempDir) -> SqliteDocumentStore {
        let path = dir.path().join("schema.db");
        SqliteDocumentStore::open(path.to_str().expect("utf-8 path"), DbRuntimeSettings::default())
            .expect("store should open")
    }

    fn retreat_schema() -> EventTypeSchema {
        EventTypeSchema {
            type_id: EventTypeId(2),
            name: "Off-Site Retreat".to_string(),
            custom_fields: vec![
                FieldDefinition::new("packing_list", FieldType::Text),
                FieldDefinition::new("cost_per_person", FieldType::Number),
                FieldDefinition::new("meals_included", FieldType::Boolean),
            ],
        }
    }

    #[test]
    fn event_type_documents_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = open_store(&dir);

        assert!(store.event_type(EventTypeId(2)).expect("read").is_none());
        store.put_event_type(&retreat_schema()).expect("write");

        let read = store
            .event_type(EventTypeId(2))
            .expect("read")
            .expect("document should exist");
        assert_eq!(read, retreat_schema());
        assert_eq!(store.event_types().expect("list").len(), 1);
    }

    #[test]
    fn upsert_reports_created_then_updated() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = open_store(&dir);

        let mut values = rollcall_types::CustomValues::new();
        values.insert("cost_per_person".to_string(), json!(75));
        let mut data = EventCustomData {
            event_id: EventId(3),
            type_id: EventTypeId(2),
            custom_field_values: values,
        };

        assert_eq!(store.upsert_custom_data(&data).expect("create"), UpsertAction::Created);

        data.custom_field_values
            .insert("meals_included".to_string(), json!(true));
        assert_eq!(store.upsert_custom_data(&data).expect("update"), UpsertAction::Updated);

        let read = store
            .custom_data(EventId(3))
            .expect("read")
            .expect("document should exist");
        assert_eq!(read.custom_field_values.len(), 2);
    }

    #[test]
    fn custom_data_many_returns_only_existing_documents() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = open_store(&dir);
        store
            .upsert_custom_data(&EventCustomData {
                event_id: EventId(1),
                type_id: EventTypeId(1),
                custom_field_values: rollcall_types::CustomValues::new(),
            })
            .expect("create");

        let found = store
            .custom_data_many(&[EventId(1), EventId(2)])
            .expect("read");
        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&EventId(1)));
        assert!(store.custom_data_many(&[]).expect("empty read").is_empty());
    }

    #[test]
    fn reopening_keeps_documents() {
        let dir = tempfile::tempdir().expect("temp dir");
        open_store(&dir)
            .put_event_type(&retreat_schema())
            .expect("write");

        let reopened = open_store(&dir);
        assert!(reopened.event_type(EventTypeId(2)).expect("read").is_some());
        reopened.ping().expect("ping");
    }
}
