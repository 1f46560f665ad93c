//! Read-only views combining all three stores.
//!
//! The registry row is mandatory. Live state and custom values are
//! optional sources: when their store fails, the view still returns with
//! that part marked [`Sourced::Unavailable`].

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveTime;
use rollcall_registry::{
    attendees_for_event, event_type_exists, event_type_name, events_by_type, get_event,
    participants_by_ids, Event,
};
use rollcall_types::{CustomValues, EventCustomData, EventId, EventTypeId, ParticipantId};
use serde::Serialize;

use crate::context::StoreContext;
use crate::coordinator::{AttendanceCoordinator, LiveAttendee};
use crate::error::{AttendanceError, Missing, StoreKind};

/// A value read from a store that may have been unreachable.
///
/// Serializes as `{"status": "available", "value": ...}` or
/// `{"status": "unavailable", "value": {"reason": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Sourced<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Sourced<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Returns the value if the source answered.
    pub fn available(&self) -> Option<&T> {
        match self {
            Self::Available(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    fn from_result<E: fmt::Display>(
        result: Result<T, E>,
        store: StoreKind,
        event_id: EventId,
    ) -> Self {
        match result {
            Ok(value) => Self::Available(value),
            Err(e) => {
                tracing::warn!(
                    event_id = %event_id,
                    store = store.as_str(),
                    error = %e,
                    "source unavailable, returning partial view"
                );
                Self::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Live attendance at the time of the read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveSnapshot {
    /// Equals `participants.len()`.
    pub count: u64,
    pub participants: Vec<LiveAttendee>,
}

impl LiveSnapshot {
    fn from_attendees(participants: Vec<LiveAttendee>) -> Self {
        Self {
            count: participants.len() as u64,
            participants,
        }
    }
}

/// An attendee record reconciled into the registry by finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordedAttendee {
    pub participant_id: ParticipantId,
    pub check_in_time: Option<NaiveTime>,
    pub check_out_time: Option<NaiveTime>,
}

/// One event as seen through all three stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedEventView {
    pub event: Event,
    pub event_type_name: Option<String>,
    /// Durable attendance. Empty until the event is finalized.
    pub recorded: Vec<RecordedAttendee>,
    pub live: Sourced<LiveSnapshot>,
    /// `Available(None)` means the event has no custom data document.
    pub custom_values: Sourced<Option<CustomValues>>,
}

impl MergedEventView {
    /// Lists the optional sources that could not be read.
    pub fn degraded_sources(&self) -> Vec<StoreKind> {
        let mut degraded = Vec::new();
        if !self.live.is_available() {
            degraded.push(StoreKind::LiveState);
        }
        if !self.custom_values.is_available() {
            degraded.push(StoreKind::SchemaStore);
        }
        degraded
    }
}

/// A checked-in participant joined with their registry name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckedInParticipant {
    pub participant_id: ParticipantId,
    /// `None` if the participant row is gone from the registry.
    pub name: Option<String>,
    pub check_in_time: Option<String>,
}

/// One event of a type with the people checked in to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeAttendanceEntry {
    pub event: Event,
    pub checked_in: Sourced<Vec<CheckedInParticipant>>,
    pub custom_values: Sourced<Option<CustomValues>>,
}

/// Builds merged read views.
#[derive(Debug, Clone)]
pub struct EventViewMerger {
    ctx: StoreContext,
    coordinator: AttendanceCoordinator,
}

impl EventViewMerger {
    pub fn new(ctx: StoreContext) -> Self {
        let coordinator = AttendanceCoordinator::new(ctx.clone());
        Self { ctx, coordinator }
    }

    /// Builds the merged view of one event.
    ///
    /// # Errors
    ///
    /// `NotFound` if the event does not exist and `StoreUnavailable` if the
    /// registry cannot be read. Live state and schema store failures do not
    /// fail the call.
    pub fn merged_event_view(&self, event_id: EventId) -> Result<MergedEventView, AttendanceError> {
        let (event, event_type_name, recorded) = self.ctx.with_registry(|conn| {
            let event = get_event(conn, event_id)?.ok_or(Missing::Event(event_id))?;
            let type_name = event_type_name(conn, event.event_type_id)?;
            let recorded = attendees_for_event(conn, event_id)?
                .into_iter()
                .map(|(participant_id, record)| RecordedAttendee {
                    participant_id,
                    check_in_time: record.check_in_time,
                    check_out_time: record.check_out_time,
                })
                .collect();
            Ok((event, type_name, recorded))
        })?;

        let live = Sourced::from_result(
            self.coordinator
                .live_attendees(event_id)
                .map(LiveSnapshot::from_attendees),
            StoreKind::LiveState,
            event_id,
        );
        let custom_values = Sourced::from_result(
            self.ctx
                .schema
                .custom_data(event_id)
                .map(|data| data.map(|d| d.custom_field_values)),
            StoreKind::SchemaStore,
            event_id,
        );

        Ok(MergedEventView {
            event,
            event_type_name,
            recorded,
            live,
            custom_values,
        })
    }

    /// Builds one merged view per requested event, in request order.
    pub fn merged_event_views(
        &self,
        event_ids: &[EventId],
    ) -> Vec<Result<MergedEventView, AttendanceError>> {
        event_ids
            .iter()
            .map(|&event_id| self.merged_event_view(event_id))
            .collect()
    }

    /// Lists every event of a type with its checked-in participants and
    /// custom values.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown type and `StoreUnavailable` if the
    /// registry cannot be read.
    pub fn checked_in_by_type(
        &self,
        type_id: EventTypeId,
    ) -> Result<Vec<TypeAttendanceEntry>, AttendanceError> {
        let events = self.ctx.with_registry(|conn| {
            if !event_type_exists(conn, type_id)? {
                return Err(Missing::EventType(type_id).into());
            }
            Ok(events_by_type(conn, type_id)?)
        })?;

        let event_ids: Vec<EventId> = events.iter().map(|e| e.id).collect();
        let custom: Result<HashMap<EventId, EventCustomData>, String> = self
            .ctx
            .schema
            .custom_data_many(&event_ids)
            .map_err(|e| e.to_string());

        let live: Vec<Result<Vec<LiveAttendee>, AttendanceError>> = event_ids
            .iter()
            .map(|&event_id| self.coordinator.live_attendees(event_id))
            .collect();

        let mut wanted: Vec<ParticipantId> = live
            .iter()
            .flatten()
            .flatten()
            .map(|attendee| attendee.participant_id)
            .collect();
        wanted.sort();
        wanted.dedup();
        let names = self
            .ctx
            .with_registry(|conn| Ok(participants_by_ids(conn, &wanted)?))?;

        Ok(events
            .into_iter()
            .zip(live)
            .map(|(event, attendees)| {
                let checked_in = Sourced::from_result(
                    attendees.map(|list| {
                        list.into_iter()
                            .map(|attendee| CheckedInParticipant {
                                name: names
                                    .get(&attendee.participant_id)
                                    .map(|p| p.display_name()),
                                participant_id: attendee.participant_id,
                                check_in_time: attendee.check_in_time,
                            })
                            .collect()
                    }),
                    StoreKind::LiveState,
                    event.id,
                );
                let custom_values = Sourced::from_result(
                    custom
                        .as_ref()
                        .map(|docs| docs.get(&event.id).map(|d| d.custom_field_values.clone()))
                        .map_err(Clone::clone),
                    StoreKind::SchemaStore,
                    event.id,
                );
                TypeAttendanceEntry {
                    event,
                    checked_in,
                    custom_values,
                }
            })
            .collect())
    }
}
