//! Event attendance across the registry, live state and schema stores.
//!
//! While an event runs, check-ins and check-outs only touch live state
//! (after the registry confirms the event and the registration). At close,
//! [`FinalizationReconciler::finalize`] drains live state into durable
//! attendee records in one registry transaction and then deletes the live
//! keys. Reads that span all three stores go through [`EventViewMerger`],
//! which degrades per source instead of failing.
//!
//! # Lifecycle
//!
//! ```text
//! NotStarted --check_in--> Active --finalize--> Finalized
//!                            ^  |
//!                            +--+ check_in / check_out
//! ```
//!
//! There is no way back from `Finalized`: check-in is rejected with
//! [`ValidationError::EventFinalized`]. Finalize itself may be repeated.
//!
//! # Errors
//!
//! Every operation returns [`AttendanceError`]. Store crate errors are
//! mapped by store and direction: reads and pool checkouts become
//! `StoreUnavailable`, registry writes become `DurableWriteFailure`.

mod context;
mod coordinator;
mod custom_data;
mod error;
mod merge;
mod reconciler;
mod service;
mod timestamp;

pub use context::{Clock, FixedClock, StoreContext, SystemClock};
pub use coordinator::{AttendanceCoordinator, CheckInOutcome, CheckOutOutcome, LiveAttendee};
pub use custom_data::{CreatedEvent, CustomDataValidator, NewEventRequest};
pub use error::{AttendanceError, Missing, StoreKind, ValidationError};
pub use merge::{
    CheckedInParticipant, EventViewMerger, LiveSnapshot, MergedEventView, RecordedAttendee,
    Sourced, TypeAttendanceEntry,
};
pub use reconciler::{FinalizationReconciler, FinalizeReport};
pub use service::{AttendanceService, StoreStatus};
pub use timestamp::{format_timestamp, parse_timestamp, TIMESTAMP_FORMAT};
