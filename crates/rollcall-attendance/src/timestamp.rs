//! Live state timestamps.
//!
//! Live state holds full local timestamps (`2025-01-10T19:02:11.532871`).
//! The registry keeps only the time of day.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rollcall_types::{EventId, ParticipantId};

/// Format written to the check-in and check-out hashes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Formats an instant for live state.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a live state timestamp.
///
/// Accepts local ISO-8601 with or without fractional seconds, and RFC 3339
/// with an offset (reduced to its own wall-clock time).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
}

/// Reduces a stored timestamp to whole-second time of day.
///
/// Returns `None` (and logs) if the value does not parse. Logs a warning
/// when the timestamp falls on a different day than `finalize_day`, since
/// the date is not retained.
pub(crate) fn time_of_day(
    raw: &str,
    finalize_day: NaiveDate,
    event_id: EventId,
    participant_id: ParticipantId,
) -> Option<NaiveTime> {
    let Some(at) = parse_timestamp(raw) else {
        tracing::warn!(
            event_id = %event_id,
            participant_id = %participant_id,
            value = raw,
            "unparseable live state timestamp, persisting null"
        );
        return None;
    };

    if at.date() != finalize_day {
        tracing::warn!(
            event_id = %event_id,
            participant_id = %participant_id,
            recorded_on = %at.date(),
            finalized_on = %finalize_day,
            "timestamp date differs from finalize day; only the time of day is kept"
        );
    }

    Some(at.time().with_nanosecond(0).unwrap_or(at.time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date")
    }

    #[test]
    fn formats_with_microseconds() {
        let at = day()
            .and_hms_micro_opt(19, 2, 11, 532_871)
            .expect("valid time");
        assert_eq!(format_timestamp(at), "2025-01-10T19:02:11.532871");
        assert_eq!(parse_timestamp(&format_timestamp(at)), Some(at));
    }

    #[test]
    fn parses_common_shapes() {
        let expected = day().and_hms_opt(19, 2, 11).expect("valid time");
        assert_eq!(parse_timestamp("2025-01-10T19:02:11"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-10T19:02:11+02:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday evening"), None);
    }

    #[test]
    fn time_of_day_truncates_fraction() {
        let time = time_of_day(
            "2025-01-10T19:02:11.999999",
            day(),
            EventId(42),
            ParticipantId(7),
        );
        assert_eq!(time, NaiveTime::from_hms_opt(19, 2, 11));
    }

    #[test]
    fn time_of_day_keeps_time_across_days() {
        let time = time_of_day(
            "2025-01-09T23:58:00",
            day(),
            EventId(42),
            ParticipantId(7),
        );
        assert_eq!(time, NaiveTime::from_hms_opt(23, 58, 0));
        assert_eq!(time_of_day("garbage", day(), EventId(42), ParticipantId(7)), None);
    }
}
