mod common;

use chrono::Duration;
use common::{Harness, EVENT, OTHER_REGISTERED, PARTICIPANT, UNREGISTERED};
use rollcall_attendance::{
    AttendanceError, CheckOutOutcome, Missing, StoreKind, ValidationError,
};
use rollcall_live::LiveStateStore;
use rollcall_types::{EventId, LifecycleState};

#[test]
fn check_in_records_membership_and_timestamp() {
    let h = Harness::new();

    let outcome = h.service.check_in(EVENT, PARTICIPANT).expect("check-in");
    assert!(!outcome.already_checked_in);
    assert_eq!(outcome.live_count, 1);

    let live = h.service.query_live(EVENT).expect("query");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].participant_id, PARTICIPANT);
    assert_eq!(
        live[0].check_in_time.as_deref(),
        Some("2025-01-10T19:02:11.000000")
    );
}

#[test]
fn repeated_check_in_keeps_original_timestamp() {
    let h = Harness::new();
    h.service.check_in(EVENT, PARTICIPANT).expect("first check-in");

    h.clock.advance(Duration::minutes(5));
    let outcome = h.service.check_in(EVENT, PARTICIPANT).expect("second check-in");
    assert!(outcome.already_checked_in);
    assert_eq!(outcome.live_count, 1);
    assert_eq!(
        outcome.checked_in_at.as_deref(),
        Some("2025-01-10T19:02:11.000000")
    );

    let recorded = h
        .live
        .check_in_time(EVENT, PARTICIPANT)
        .expect("read timestamp");
    assert_eq!(recorded.as_deref(), Some("2025-01-10T19:02:11.000000"));
}

#[test]
fn check_in_requires_event_and_registration() {
    let h = Harness::new();

    let err = h
        .service
        .check_in(EventId(999), PARTICIPANT)
        .expect_err("unknown event");
    assert!(matches!(err, AttendanceError::NotFound(Missing::Event(EventId(999)))));

    let err = h
        .service
        .check_in(EVENT, UNREGISTERED)
        .expect_err("unregistered participant");
    assert!(matches!(
        err,
        AttendanceError::NotFound(Missing::Registration { .. })
    ));
    assert_eq!(h.service.live_count(EVENT).expect("count"), 0);
}

#[test]
fn check_out_of_non_member_changes_nothing() {
    let h = Harness::new();
    h.service.check_in(EVENT, OTHER_REGISTERED).expect("check-in");

    let outcome = h.service.check_out(EVENT, PARTICIPANT).expect("check-out");
    assert_eq!(outcome, CheckOutOutcome::NotCheckedIn);
    assert!(h
        .live
        .check_out_times(EVENT)
        .expect("read times")
        .is_empty());
    assert_eq!(h.service.live_count(EVENT).expect("count"), 1);
}

#[test]
fn check_out_keeps_check_in_time() {
    let h = Harness::new();
    h.service.check_in(EVENT, PARTICIPANT).expect("check-in");
    h.clock.advance(Duration::minutes(90));

    let outcome = h.service.check_out(EVENT, PARTICIPANT).expect("check-out");
    assert_eq!(
        outcome,
        CheckOutOutcome::CheckedOut {
            checked_out_at: "2025-01-10T20:32:11.000000".to_string(),
            live_count: 0,
        }
    );
    assert_eq!(
        h.live
            .check_in_time(EVENT, PARTICIPANT)
            .expect("read timestamp")
            .as_deref(),
        Some("2025-01-10T19:02:11.000000")
    );

    let err = h
        .service
        .check_out(EventId(999), PARTICIPANT)
        .expect_err("unknown event");
    assert!(matches!(err, AttendanceError::NotFound(_)));
}

#[test]
fn live_count_matches_query_length() {
    let h = Harness::new();
    let assert_consistent = |h: &Harness| {
        let count = h.service.live_count(EVENT).expect("count");
        let listed = h.service.query_live(EVENT).expect("query").len() as u64;
        assert_eq!(count, listed);
    };

    assert_consistent(&h);
    h.service.check_in(EVENT, PARTICIPANT).expect("check-in 7");
    assert_consistent(&h);
    h.service.check_in(EVENT, OTHER_REGISTERED).expect("check-in 9");
    assert_consistent(&h);
    h.service.check_in(EVENT, PARTICIPANT).expect("repeat check-in 7");
    assert_consistent(&h);
    h.service.check_out(EVENT, PARTICIPANT).expect("check-out 7");
    assert_consistent(&h);

    let live = h.service.query_live(EVENT).expect("query");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].participant_id, OTHER_REGISTERED);
}

#[test]
fn member_without_timestamp_reports_none() {
    let h = Harness::new();
    h.live.add_member(EVENT, PARTICIPANT).expect("raw add");

    let live = h.service.query_live(EVENT).expect("query");
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].check_in_time, None);
}

#[test]
fn live_state_outage_is_not_reported_as_empty() {
    let h = Harness::new();
    h.service.check_in(EVENT, PARTICIPANT).expect("check-in");
    h.live.set_down(true);

    for err in [
        h.service.check_in(EVENT, OTHER_REGISTERED).map(|_| ()),
        h.service.check_out(EVENT, PARTICIPANT).map(|_| ()),
        h.service.query_live(EVENT).map(|_| ()),
        h.service.live_count(EVENT).map(|_| ()),
    ]
    .into_iter()
    .map(|result| result.expect_err("live state is down"))
    {
        assert!(matches!(
            err,
            AttendanceError::StoreUnavailable {
                store: StoreKind::LiveState,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    h.live.set_down(false);
    assert_eq!(h.service.live_count(EVENT).expect("count"), 1);
}

#[test]
fn lifecycle_moves_forward_only() {
    let h = Harness::new();
    assert_eq!(
        h.service.lifecycle(EVENT).expect("lifecycle"),
        LifecycleState::NotStarted
    );

    h.service.check_in(EVENT, PARTICIPANT).expect("check-in");
    assert_eq!(
        h.service.lifecycle(EVENT).expect("lifecycle"),
        LifecycleState::Active
    );

    h.service.finalize(EVENT).expect("finalize");
    assert_eq!(
        h.service.lifecycle(EVENT).expect("lifecycle"),
        LifecycleState::Finalized
    );

    let err = h
        .service
        .check_in(EVENT, PARTICIPANT)
        .expect_err("finalized event");
    assert!(matches!(
        err,
        AttendanceError::Validation(ValidationError::EventFinalized(EventId(42)))
    ));
    assert_eq!(h.service.live_count(EVENT).expect("count"), 0);
}
