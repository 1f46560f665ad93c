//! Registrations and reconciled attendee records.

use chrono::NaiveTime;
use rollcall_types::{EventId, ParticipantId, RegistrationId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::RegistryError;

/// Storage format of attendee check-in/check-out times.
pub const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";

/// A participant's registration for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub participant_id: ParticipantId,
    pub event_id: EventId,
}

/// Reconciled attendance for one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    pub registration_id: RegistrationId,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
}

fn format_time(time: Option<NaiveTime>) -> Option<String> {
    time.map(|t| t.format(TIME_OF_DAY_FORMAT).to_string())
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        NaiveTime::parse_from_str(&s, TIME_OF_DAY_FORMAT)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Looks up the registration linking `participant_id` to `event_id`.
pub fn find_registration(
    conn: &Connection,
    event_id: EventId,
    participant_id: ParticipantId,
) -> Result<Option<Registration>, RegistryError> {
    let registration = conn
        .query_row(
            "SELECT id, participant_id, event_id FROM registrations
             WHERE event_id = ?1 AND participant_id = ?2",
            params![event_id.get(), participant_id.get()],
            |row| {
                Ok(Registration {
                    id: RegistrationId(row.get(0)?),
                    participant_id: ParticipantId(row.get(1)?),
                    event_id: EventId(row.get(2)?),
                })
            },
        )
        .optional()?;
    Ok(registration)
}

/// Registers a participant for an event and returns the registration id.
pub fn insert_registration(
    conn: &Connection,
    event_id: EventId,
    participant_id: ParticipantId,
) -> Result<RegistrationId, RegistryError> {
    conn.execute(
        "INSERT INTO registrations (participant_id, event_id) VALUES (?1, ?2)",
        params![participant_id.get(), event_id.get()],
    )?;
    Ok(RegistrationId(conn.last_insert_rowid()))
}

/// Inserts the attendee record, or replaces both times if one already
/// exists for the registration.
pub fn upsert_attendee(conn: &Connection, record: &AttendeeRecord) -> Result<(), RegistryError> {
    conn.execute(
        "INSERT INTO attendees (registration_id, check_in_time, check_out_time)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(registration_id) DO UPDATE SET
            check_in_time = excluded.check_in_time,
            check_out_time = excluded.check_out_time",
        params![
            record.registration_id.get(),
            format_time(record.check_in_time),
            format_time(record.check_out_time),
        ],
    )?;
    Ok(())
}

/// Lists the attendee records of an event together with the participant
/// each belongs to, ordered by participant.
pub fn attendees_for_event(
    conn: &Connection,
    event_id: EventId,
) -> Result<Vec<(ParticipantId, AttendeeRecord)>, RegistryError> {
    let mut stmt = conn.prepare(
        "SELECT r.participant_id, a.registration_id, a.check_in_time, a.check_out_time
         FROM attendees a
         JOIN registrations r ON r.id = a.registration_id
         WHERE r.event_id = ?1
         ORDER BY r.participant_id ASC",
    )?;
    let rows = stmt.query_map([event_id.get()], |row| {
        Ok((
            ParticipantId(row.get(0)?),
            AttendeeRecord {
                registration_id: RegistrationId(row.get(1)?),
                check_in_time: parse_time(row, 2)?,
                check_out_time: parse_time(row, 3)?,
            },
        ))
    })?;

    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}
