//! The live state seam.

use std::collections::HashMap;

use rollcall_types::{EventId, ParticipantId};

use crate::LiveStateError;

/// Participant id to raw ISO-8601 timestamp, as held in a time hash.
pub type ParticipantTimes = HashMap<ParticipantId, String>;

/// Per-event live attendance state.
///
/// Every method is a single atomic store operation. Callers compose them
/// without a surrounding transaction; idempotency of check-in and check-out
/// comes from the return values of [`add_member`](Self::add_member) and
/// [`remove_member`](Self::remove_member).
pub trait LiveStateStore: Send + Sync {
    /// Adds the participant to the event's checked-in set.
    ///
    /// Returns `true` if the participant was newly added, `false` if they
    /// were already a member.
    fn add_member(&self, event: EventId, participant: ParticipantId)
        -> Result<bool, LiveStateError>;

    /// Removes the participant from the checked-in set.
    ///
    /// Returns `true` if the participant was a member.
    fn remove_member(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<bool, LiveStateError>;

    /// Returns the current members in ascending id order. An absent set is
    /// empty.
    fn members(&self, event: EventId) -> Result<Vec<ParticipantId>, LiveStateError>;

    /// Returns the number of participants [`members`](Self::members) reports.
    fn member_count(&self, event: EventId) -> Result<u64, LiveStateError>;

    /// Writes the participant's check-in timestamp.
    fn record_check_in(
        &self,
        event: EventId,
        participant: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError>;

    /// Writes the participant's check-out timestamp.
    fn record_check_out(
        &self,
        event: EventId,
        participant: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError>;

    /// Reads one participant's check-in timestamp.
    fn check_in_time(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<Option<String>, LiveStateError>;

    /// Reads every check-in timestamp recorded for the event.
    fn check_in_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError>;

    /// Reads every check-out timestamp recorded for the event.
    fn check_out_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError>;

    /// Returns `true` if any of the event's three keys exists.
    fn has_state(&self, event: EventId) -> Result<bool, LiveStateError>;

    /// Deletes all three keys of the event.
    fn clear_event(&self, event: EventId) -> Result<(), LiveStateError>;

    /// Round-trips a no-op command to verify reachability.
    fn ping(&self) -> Result<(), LiveStateError>;
}
