//! Event rows.

use rollcall_types::{EventId, EventTypeId, PlaceId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::RegistryError;

/// An event as stored in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_type_id: EventTypeId,
    pub place_id: PlaceId,
    /// Scheduled start (ISO 8601), if known.
    pub start_date_time: Option<String>,
    /// Scheduled end (ISO 8601), if known.
    pub end_date_time: Option<String>,
    /// When attendance was reconciled. `None` until the first finalize.
    pub finalized_at: Option<String>,
}

impl Event {
    /// Returns `true` once attendance has been reconciled.
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }
}

/// Parameters for inserting a new event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    pub event_type_id: EventTypeId,
    pub place_id: PlaceId,
    pub start_date_time: Option<String>,
    pub end_date_time: Option<String>,
}

const EVENT_COLUMNS: &str =
    "id, name, event_type_id, place_id, start_date_time, end_date_time, finalized_at";

fn map_row_to_event(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: EventId(row.get(0)?),
        name: row.get(1)?,
        event_type_id: EventTypeId(row.get(2)?),
        place_id: PlaceId(row.get(3)?),
        start_date_time: row.get(4)?,
        end_date_time: row.get(5)?,
        finalized_at: row.get(6)?,
    })
}

/// Retrieves an event by id.
pub fn get_event(conn: &Connection, event_id: EventId) -> Result<Option<Event>, RegistryError> {
    let event = conn
        .query_row(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
            [event_id.get()],
            map_row_to_event,
        )
        .optional()?;
    Ok(event)
}

/// Lists every event of the given type, ordered by id.
pub fn events_by_type(
    conn: &Connection,
    type_id: EventTypeId,
) -> Result<Vec<Event>, RegistryError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE event_type_id = ?1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([type_id.get()], map_row_to_event)?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row?);
    }
    Ok(events)
}

/// Inserts an event row and returns its id.
///
/// Type and place are enforced by foreign keys; callers validate them first
/// to report a precise not-found.
pub fn insert_event(conn: &Connection, event: &NewEvent) -> Result<EventId, RegistryError> {
    conn.execute(
        "INSERT INTO events (name, event_type_id, place_id, start_date_time, end_date_time)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event.name,
            event.event_type_id.get(),
            event.place_id.get(),
            event.start_date_time,
            event.end_date_time,
        ],
    )?;
    Ok(EventId(conn.last_insert_rowid()))
}

/// Stamps the event as finalized unless it already is.
///
/// Returns `true` if this call set the stamp. The first stamp is kept on
/// repeated finalization.
pub fn mark_finalized(
    conn: &Connection,
    event_id: EventId,
    finalized_at: &str,
) -> Result<bool, RegistryError> {
    let changed = conn.execute(
        "UPDATE events SET finalized_at = ?2 WHERE id = ?1 AND finalized_at IS NULL",
        params![event_id.get(), finalized_at],
    )?;
    Ok(changed > 0)
}
