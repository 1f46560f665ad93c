//! Check-in, check-out and live queries.
//!
//! Every operation validates against the registry first, then touches live
//! state. The registry connection is released before the first live state
//! call.

use rollcall_registry::{find_registration, get_event, Event};
use rollcall_types::{EventId, LifecycleState, ParticipantId};
use serde::Serialize;

use crate::context::StoreContext;
use crate::error::{AttendanceError, Missing, ValidationError};
use crate::timestamp::format_timestamp;

/// Result of a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInOutcome {
    pub event_id: EventId,
    pub participant_id: ParticipantId,
    /// `true` if the participant was already checked in; nothing changed.
    pub already_checked_in: bool,
    /// The participant's recorded check-in time. On a repeat call this is
    /// the original time; `None` if the membership has no timestamp.
    pub checked_in_at: Option<String>,
    /// Cardinality of the checked-in set after the call.
    pub live_count: u64,
}

/// Result of a check-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutOutcome {
    CheckedOut {
        checked_out_at: String,
        live_count: u64,
    },
    /// The participant was not in the checked-in set. No state changed.
    NotCheckedIn,
}

/// A participant currently checked in, with their raw check-in timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveAttendee {
    pub participant_id: ParticipantId,
    /// `None` if the membership exists without a recorded timestamp.
    pub check_in_time: Option<String>,
}

/// Mutates and reads live attendance.
#[derive(Debug, Clone)]
pub struct AttendanceCoordinator {
    ctx: StoreContext,
}

impl AttendanceCoordinator {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    fn require_event(&self, event_id: EventId) -> Result<Event, AttendanceError> {
        self.ctx.with_registry(|conn| {
            get_event(conn, event_id)?.ok_or_else(|| Missing::Event(event_id).into())
        })
    }

    /// Checks a registered participant in.
    ///
    /// Repeating the call is a no-op that keeps the first timestamp.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event or a missing registration,
    /// `Validation(EventFinalized)` once the event is finalized, and
    /// `StoreUnavailable` if the registry or live state cannot be read.
    pub fn check_in(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<CheckInOutcome, AttendanceError> {
        self.ctx.with_registry(|conn| {
            let event = get_event(conn, event_id)?.ok_or(Missing::Event(event_id))?;
            if event.is_finalized() {
                return Err(ValidationError::EventFinalized(event_id).into());
            }
            find_registration(conn, event_id, participant_id)?.ok_or(Missing::Registration {
                event: event_id,
                participant: participant_id,
            })?;
            Ok(())
        })?;

        let live = &self.ctx.live;
        let newly_added = live.add_member(event_id, participant_id)?;
        let checked_in_at = if newly_added {
            let at = format_timestamp(self.ctx.clock.now());
            live.record_check_in(event_id, participant_id, &at)?;
            tracing::info!(
                event_id = %event_id,
                participant_id = %participant_id,
                at = %at,
                "participant checked in"
            );
            Some(at)
        } else {
            tracing::debug!(
                event_id = %event_id,
                participant_id = %participant_id,
                "participant already checked in"
            );
            live.check_in_time(event_id, participant_id)?
        };

        Ok(CheckInOutcome {
            event_id,
            participant_id,
            already_checked_in: !newly_added,
            checked_in_at,
            live_count: live.member_count(event_id)?,
        })
    }

    /// Checks a participant out. The check-in timestamp is left in place.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event, `StoreUnavailable` if a store
    /// cannot be reached.
    pub fn check_out(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<CheckOutOutcome, AttendanceError> {
        self.require_event(event_id)?;

        let live = &self.ctx.live;
        if !live.remove_member(event_id, participant_id)? {
            tracing::debug!(
                event_id = %event_id,
                participant_id = %participant_id,
                "check-out ignored, participant not checked in"
            );
            return Ok(CheckOutOutcome::NotCheckedIn);
        }

        let checked_out_at = format_timestamp(self.ctx.clock.now());
        live.record_check_out(event_id, participant_id, &checked_out_at)?;
        tracing::info!(
            event_id = %event_id,
            participant_id = %participant_id,
            at = %checked_out_at,
            "participant checked out"
        );

        Ok(CheckOutOutcome::CheckedOut {
            checked_out_at,
            live_count: live.member_count(event_id)?,
        })
    }

    /// Lists everyone currently checked in, ordered by participant id.
    pub fn query_live(&self, event_id: EventId) -> Result<Vec<LiveAttendee>, AttendanceError> {
        self.require_event(event_id)?;
        self.live_attendees(event_id)
    }

    /// Returns the number of participants currently checked in.
    pub fn live_count(&self, event_id: EventId) -> Result<u64, AttendanceError> {
        self.require_event(event_id)?;
        Ok(self.ctx.live.member_count(event_id)?)
    }

    /// Reports where the event is in its attendance lifecycle.
    pub fn lifecycle(&self, event_id: EventId) -> Result<LifecycleState, AttendanceError> {
        let event = self.require_event(event_id)?;
        if event.is_finalized() {
            return Ok(LifecycleState::Finalized);
        }
        Ok(if self.ctx.live.has_state(event_id)? {
            LifecycleState::Active
        } else {
            LifecycleState::NotStarted
        })
    }

    /// Reads members and check-in times without validating the event.
    pub(crate) fn live_attendees(
        &self,
        event_id: EventId,
    ) -> Result<Vec<LiveAttendee>, AttendanceError> {
        let members = self.ctx.live.members(event_id)?;
        let mut times = self.ctx.live.check_in_times(event_id)?;
        Ok(members
            .into_iter()
            .map(|participant_id| LiveAttendee {
                participant_id,
                check_in_time: times.remove(&participant_id),
            })
            .collect())
    }
}
