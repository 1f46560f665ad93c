//! Single entry point over every attendance operation.

use rollcall_schema::UpsertAction;
use rollcall_types::{
    CustomValues, EventId, EventTypeId, EventTypeSchema, FieldDefinition, LifecycleState,
    ParticipantId,
};
use serde::Serialize;

use crate::context::StoreContext;
use crate::coordinator::{AttendanceCoordinator, CheckInOutcome, CheckOutOutcome, LiveAttendee};
use crate::custom_data::{CreatedEvent, CustomDataValidator, NewEventRequest};
use crate::error::{AttendanceError, StoreKind};
use crate::merge::{EventViewMerger, MergedEventView, TypeAttendanceEntry};
use crate::reconciler::{FinalizationReconciler, FinalizeReport};

/// Reachability of one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub store: StoreKind,
    pub reachable: bool,
    /// Failure reason when unreachable.
    pub detail: Option<String>,
}

impl StoreStatus {
    fn from_result<E: std::fmt::Display>(store: StoreKind, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                store,
                reachable: true,
                detail: None,
            },
            Err(e) => Self {
                store,
                reachable: false,
                detail: Some(e.to_string()),
            },
        }
    }
}

/// Attendance operations over one [`StoreContext`].
#[derive(Debug, Clone)]
pub struct AttendanceService {
    ctx: StoreContext,
    coordinator: AttendanceCoordinator,
    reconciler: FinalizationReconciler,
    custom_data: CustomDataValidator,
    merger: EventViewMerger,
}

impl AttendanceService {
    pub fn new(ctx: StoreContext) -> Self {
        Self {
            coordinator: AttendanceCoordinator::new(ctx.clone()),
            reconciler: FinalizationReconciler::new(ctx.clone()),
            custom_data: CustomDataValidator::new(ctx.clone()),
            merger: EventViewMerger::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &StoreContext {
        &self.ctx
    }

    pub fn check_in(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<CheckInOutcome, AttendanceError> {
        self.coordinator.check_in(event_id, participant_id)
    }

    pub fn check_out(
        &self,
        event_id: EventId,
        participant_id: ParticipantId,
    ) -> Result<CheckOutOutcome, AttendanceError> {
        self.coordinator.check_out(event_id, participant_id)
    }

    pub fn query_live(&self, event_id: EventId) -> Result<Vec<LiveAttendee>, AttendanceError> {
        self.coordinator.query_live(event_id)
    }

    pub fn live_count(&self, event_id: EventId) -> Result<u64, AttendanceError> {
        self.coordinator.live_count(event_id)
    }

    pub fn lifecycle(&self, event_id: EventId) -> Result<LifecycleState, AttendanceError> {
        self.coordinator.lifecycle(event_id)
    }

    pub fn finalize(&self, event_id: EventId) -> Result<FinalizeReport, AttendanceError> {
        self.reconciler.finalize(event_id)
    }

    pub fn define_event_type(
        &self,
        name: &str,
        custom_fields: Vec<FieldDefinition>,
    ) -> Result<EventTypeSchema, AttendanceError> {
        self.custom_data.define_event_type(name, custom_fields)
    }

    pub fn create_event(&self, request: NewEventRequest) -> Result<CreatedEvent, AttendanceError> {
        self.custom_data.create_event(request)
    }

    pub fn set_custom_data(
        &self,
        event_id: EventId,
        values: CustomValues,
    ) -> Result<UpsertAction, AttendanceError> {
        self.custom_data.set_custom_data(event_id, values)
    }

    pub fn event_type(&self, type_id: EventTypeId) -> Result<EventTypeSchema, AttendanceError> {
        self.custom_data.event_type(type_id)
    }

    pub fn event_types(&self) -> Result<Vec<EventTypeSchema>, AttendanceError> {
        self.custom_data.event_types()
    }

    pub fn merged_event_view(&self, event_id: EventId) -> Result<MergedEventView, AttendanceError> {
        self.merger.merged_event_view(event_id)
    }

    pub fn merged_event_views(
        &self,
        event_ids: &[EventId],
    ) -> Vec<Result<MergedEventView, AttendanceError>> {
        self.merger.merged_event_views(event_ids)
    }

    pub fn checked_in_by_type(
        &self,
        type_id: EventTypeId,
    ) -> Result<Vec<TypeAttendanceEntry>, AttendanceError> {
        self.merger.checked_in_by_type(type_id)
    }

    /// Pings each store once. Never fails; unreachable stores are reported
    /// in the result.
    pub fn check_stores(&self) -> Vec<StoreStatus> {
        let registry = self.ctx.registry.get().map_err(|e| e.to_string()).and_then(|conn| {
            conn.query_row("SELECT 1", [], |_| Ok(()))
                .map_err(|e| e.to_string())
        });
        vec![
            StoreStatus::from_result(StoreKind::Registry, registry),
            StoreStatus::from_result(StoreKind::LiveState, self.ctx.live.ping()),
            StoreStatus::from_result(StoreKind::SchemaStore, self.ctx.schema.ping()),
        ]
    }
}
