//! Row operations against the durable registry.
//!
//! The registry is the source of truth for events, registrations, the
//! event-type catalog and reconciled attendance. Every function here takes a
//! borrowed [`rusqlite::Connection`] (or a transaction, which derefs to one)
//! and binds all values as parameters.
//!
//! Lookups return `Option` rather than a not-found error: whether a missing
//! row is an error is decided by the caller.

mod attendance;
mod catalog;
mod events;

pub use attendance::{
    attendees_for_event, find_registration, insert_registration, upsert_attendee, AttendeeRecord,
    Registration, TIME_OF_DAY_FORMAT,
};
pub use catalog::{
    event_type_exists, event_type_name, insert_event_type, insert_participant, insert_place,
    participants_by_ids, place_exists, Participant,
};
pub use events::{events_by_type, get_event, insert_event, mark_finalized, Event, NewEvent};

use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry database error: {0}")]
    Database(#[from] rusqlite::Error),
}
