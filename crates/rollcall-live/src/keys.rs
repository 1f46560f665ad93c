//! Key naming for per-event live state.

use rollcall_types::EventId;

/// The three keys that hold one event's live state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKeys {
    /// Set of checked-in participant ids.
    pub checked_in: String,
    /// Hash of participant id to check-in timestamp.
    pub check_in_times: String,
    /// Hash of participant id to check-out timestamp.
    pub check_out_times: String,
}

impl EventKeys {
    /// Builds the key names for `event_id`.
    pub fn for_event(event_id: EventId) -> Self {
        Self {
            checked_in: format!("event:{event_id}:checkedIn"),
            check_in_times: format!("event:{event_id}:checkInTimes"),
            check_out_times: format!("event:{event_id}:checkOutTimes"),
        }
    }

    /// All three keys, in a fixed order.
    pub fn all(&self) -> [&str; 3] {
        [
            self.checked_in.as_str(),
            self.check_in_times.as_str(),
            self.check_out_times.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_event_prefix_layout() {
        let keys = EventKeys::for_event(EventId(42));
        assert_eq!(
            keys.all(),
            [
                "event:42:checkedIn",
                "event:42:checkInTimes",
                "event:42:checkOutTimes"
            ]
        );
    }
}
