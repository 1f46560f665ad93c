//! Places, participants and the event-type catalog.

use std::collections::HashMap;

use rollcall_types::{EventTypeId, ParticipantId, PlaceId};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::RegistryError;

/// A person who can register for events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub first_name: String,
    pub last_name: String,
}

impl Participant {
    /// Returns "First Last".
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Allocates a new event-type identity.
pub fn insert_event_type(conn: &Connection, name: &str) -> Result<EventTypeId, RegistryError> {
    conn.execute("INSERT INTO event_types (name) VALUES (?1)", [name])?;
    Ok(EventTypeId(conn.last_insert_rowid()))
}

/// Returns `true` if the event type exists in the catalog.
pub fn event_type_exists(conn: &Connection, type_id: EventTypeId) -> Result<bool, RegistryError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM event_types WHERE id = ?1)",
        [type_id.get()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Returns the catalog name of an event type.
pub fn event_type_name(
    conn: &Connection,
    type_id: EventTypeId,
) -> Result<Option<String>, RegistryError> {
    let name = conn
        .query_row(
            "SELECT name FROM event_types WHERE id = ?1",
            [type_id.get()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

/// Inserts a place and returns its id.
pub fn insert_place(conn: &Connection, name: &str) -> Result<PlaceId, RegistryError> {
    conn.execute("INSERT INTO places (name) VALUES (?1)", [name])?;
    Ok(PlaceId(conn.last_insert_rowid()))
}

/// Returns `true` if the place exists.
pub fn place_exists(conn: &Connection, place_id: PlaceId) -> Result<bool, RegistryError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM places WHERE id = ?1)",
        [place_id.get()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Inserts a participant and returns its id.
pub fn insert_participant(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
) -> Result<ParticipantId, RegistryError> {
    conn.execute(
        "INSERT INTO participants (first_name, last_name) VALUES (?1, ?2)",
        params![first_name, last_name],
    )?;
    Ok(ParticipantId(conn.last_insert_rowid()))
}

/// Fetches the participants with the given ids. Unknown ids are absent
/// from the result.
pub fn participants_by_ids(
    conn: &Connection,
    ids: &[ParticipantId],
) -> Result<HashMap<ParticipantId, Participant>, RegistryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    // One placeholder per id; values are bound, never interpolated.
    let placeholders = (1..=ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, first_name, last_name FROM participants WHERE id IN ({placeholders})"
    );
    let values: Vec<i64> = ids.iter().map(|id| id.get()).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(values.iter()), |row| {
        Ok(Participant {
            id: ParticipantId(row.get(0)?),
            first_name: row.get(1)?,
            last_name: row.get(2)?,
        })
    })?;

    let mut participants = HashMap::new();
    for row in rows {
        let participant = row?;
        participants.insert(participant.id, participant);
    }
    Ok(participants)
}
