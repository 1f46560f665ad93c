//! Finalization: drains live state into attendee records.

use std::collections::BTreeSet;

use rollcall_registry::{find_registration, get_event, mark_finalized, upsert_attendee, AttendeeRecord};
use rollcall_types::{EventId, ParticipantId};
use serde::Serialize;

use crate::context::StoreContext;
use crate::error::{AttendanceError, Missing};
use crate::timestamp::{format_timestamp, time_of_day};

/// Outcome of one finalize call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalizeReport {
    pub event_id: EventId,
    /// Attendee records written (inserted or replaced) by this call.
    pub persisted: usize,
    /// Live participants without a registration for the event.
    pub skipped: usize,
    /// `false` if the live keys could not be deleted after the commit.
    /// The residue is safe to reprocess with another finalize.
    pub live_state_cleared: bool,
    /// The event's finalize stamp. Repeated finalization keeps the first.
    pub finalized_at: String,
}

/// Reconciles an event's live state into the registry.
#[derive(Debug, Clone)]
pub struct FinalizationReconciler {
    ctx: StoreContext,
}

impl FinalizationReconciler {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    /// Persists one attendee record per registered participant that has
    /// live state, stamps the event finalized, then clears its live keys.
    ///
    /// The participant set is the checked-in set plus everyone with a
    /// check-in or check-out timestamp, so those who already left are kept.
    /// Records are upserted by registration, which makes a second call
    /// harmless.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown event, `StoreUnavailable` if live state or
    /// a registry read fails, and `DurableWriteFailure` if the transaction
    /// does not commit. In every error case live state is left untouched.
    pub fn finalize(&self, event_id: EventId) -> Result<FinalizeReport, AttendanceError> {
        let event = self.ctx.with_registry(|conn| {
            get_event(conn, event_id)?.ok_or_else(|| Missing::Event(event_id).into())
        })?;

        // No registry connection is held while live state is read.
        let live = &self.ctx.live;
        let members = live.members(event_id)?;
        let check_ins = live.check_in_times(event_id)?;
        let check_outs = live.check_out_times(event_id)?;

        let participants: BTreeSet<ParticipantId> = members
            .into_iter()
            .chain(check_ins.keys().copied())
            .chain(check_outs.keys().copied())
            .collect();

        let now = self.ctx.clock.now();
        let today = now.date();

        let mut conn = self.ctx.registry.get()?;
        let mut staged = Vec::with_capacity(participants.len());
        let mut skipped = 0;
        for participant_id in participants {
            let Some(registration) = find_registration(&conn, event_id, participant_id)? else {
                tracing::warn!(
                    event_id = %event_id,
                    participant_id = %participant_id,
                    "live participant has no registration, skipping"
                );
                skipped += 1;
                continue;
            };

            let reduce = |raw: Option<&String>| {
                raw.and_then(|raw| time_of_day(raw, today, event_id, participant_id))
            };
            staged.push(AttendeeRecord {
                registration_id: registration.id,
                check_in_time: reduce(check_ins.get(&participant_id)),
                check_out_time: reduce(check_outs.get(&participant_id)),
            });
        }

        let stamp = format_timestamp(now);
        let tx = conn.transaction().map_err(AttendanceError::durable)?;
        for record in &staged {
            upsert_attendee(&tx, record).map_err(AttendanceError::durable)?;
        }
        mark_finalized(&tx, event_id, &stamp).map_err(AttendanceError::durable)?;
        tx.commit().map_err(AttendanceError::durable)?;
        drop(conn);

        let live_state_cleared = match live.clear_event(event_id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    event_id = %event_id,
                    error = %e,
                    "attendance committed but live state was not cleared"
                );
                false
            }
        };

        let finalized_at = event.finalized_at.unwrap_or(stamp);
        tracing::info!(
            event_id = %event_id,
            persisted = staged.len(),
            skipped,
            live_state_cleared,
            "event finalized"
        );

        Ok(FinalizeReport {
            event_id,
            persisted: staged.len(),
            skipped,
            live_state_cleared,
            finalized_at,
        })
    }
}
