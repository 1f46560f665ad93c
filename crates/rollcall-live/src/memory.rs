//! In-process live state with the same semantics as the Redis backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use rollcall_types::{EventId, ParticipantId};

use crate::store::{LiveStateStore, ParticipantTimes};
use crate::LiveStateError;

#[derive(Debug, Default)]
struct EventState {
    checked_in: BTreeSet<ParticipantId>,
    check_in_times: ParticipantTimes,
    check_out_times: ParticipantTimes,
}

impl EventState {
    fn is_empty(&self) -> bool {
        self.checked_in.is_empty() && self.check_in_times.is_empty() && self.check_out_times.is_empty()
    }
}

/// Live state held in a mutex-guarded map.
///
/// Entries are dropped as soon as all three of an event's collections are
/// empty, mirroring Redis deleting empty sets and hashes.
#[derive(Debug, Default)]
pub struct MemoryLiveState {
    events: Mutex<HashMap<EventId, EventState>>,
}

impl MemoryLiveState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<EventId, EventState>>, LiveStateError> {
        self.events.lock().map_err(|_| LiveStateError::Poisoned)
    }

    fn prune(events: &mut HashMap<EventId, EventState>, event: EventId) {
        if events.get(&event).is_some_and(EventState::is_empty) {
            events.remove(&event);
        }
    }
}

impl LiveStateStore for MemoryLiveState {
    fn add_member(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<bool, LiveStateError> {
        let mut events = self.lock()?;
        Ok(events.entry(event).or_default().checked_in.insert(participant))
    }

    fn remove_member(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<bool, LiveStateError> {
        let mut events = self.lock()?;
        let removed = events
            .get_mut(&event)
            .is_some_and(|state| state.checked_in.remove(&participant));
        Self::prune(&mut events, event);
        Ok(removed)
    }

    fn members(&self, event: EventId) -> Result<Vec<ParticipantId>, LiveStateError> {
        let events = self.lock()?;
        Ok(events
            .get(&event)
            .map(|state| state.checked_in.iter().copied().collect())
            .unwrap_or_default())
    }

    fn member_count(&self, event: EventId) -> Result<u64, LiveStateError> {
        let events = self.lock()?;
        Ok(events
            .get(&event)
            .map_or(0, |state| state.checked_in.len() as u64))
    }

    fn record_check_in(
        &self,
        event: EventId,
        participant: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError> {
        let mut events = self.lock()?;
        events
            .entry(event)
            .or_default()
            .check_in_times
            .insert(participant, timestamp.to_string());
        Ok(())
    }

    fn record_check_out(
        &self,
        event: EventId,
        participant: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError> {
        let mut events = self.lock()?;
        events
            .entry(event)
            .or_default()
            .check_out_times
            .insert(participant, timestamp.to_string());
        Ok(())
    }

    fn check_in_time(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<Option<String>, LiveStateError> {
        let events = self.lock()?;
        Ok(events
            .get(&event)
            .and_then(|state| state.check_in_times.get(&participant).cloned()))
    }

    fn check_in_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError> {
        let events = self.lock()?;
        Ok(events
            .get(&event)
            .map(|state| state.check_in_times.clone())
            .unwrap_or_default())
    }

    fn check_out_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError> {
        let events = self.lock()?;
        Ok(events
            .get(&event)
            .map(|state| state.check_out_times.clone())
            .unwrap_or_default())
    }

    fn has_state(&self, event: EventId) -> Result<bool, LiveStateError> {
        let events = self.lock()?;
        Ok(events.contains_key(&event))
    }

    fn clear_event(&self, event: EventId) -> Result<(), LiveStateError> {
        let mut events = self.lock()?;
        events.remove(&event);
        Ok(())
    }

    fn ping(&self) -> Result<(), LiveStateError> {
        self.lock().map(|_| ())
    }
}
