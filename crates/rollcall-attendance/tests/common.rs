#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rollcall_attendance::{AttendanceService, Clock, StoreContext};
use rollcall_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use rollcall_live::{LiveStateError, LiveStateStore, MemoryLiveState, ParticipantTimes};
use rollcall_schema::{MemorySchemaStore, SchemaStore, SchemaStoreError, UpsertAction};
use rollcall_types::{EventCustomData, EventId, EventTypeId, EventTypeSchema, ParticipantId};
use tempfile::TempDir;

pub const EVENT: EventId = EventId(42);
pub const PARTICIPANT: ParticipantId = ParticipantId(7);
pub const UNREGISTERED: ParticipantId = ParticipantId(8);
pub const OTHER_REGISTERED: ParticipantId = ParticipantId(9);
pub const TYPE: EventTypeId = EventTypeId(1);

pub fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 10)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .expect("valid test instant")
}

/// Clock the test moves by hand.
pub struct ManualClock(Mutex<NaiveDateTime>);

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self(Mutex::new(start))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().expect("clock lock");
        *now += by;
    }

    pub fn set(&self, to: NaiveDateTime) {
        *self.0.lock().expect("clock lock") = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().expect("clock lock")
    }
}

fn refused() -> LiveStateError {
    LiveStateError::Command(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

/// Memory live state that can be switched off, wholesale or for deletes.
#[derive(Default)]
pub struct SwitchableLiveState {
    inner: MemoryLiveState,
    down: AtomicBool,
    clear_fails: AtomicBool,
    watched: Mutex<Option<DbPool>>,
    idle_seen: Mutex<Vec<u32>>,
}

impl SwitchableLiveState {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn fail_clears(&self, fail: bool) {
        self.clear_fails.store(fail, Ordering::SeqCst);
    }

    /// Records the registry pool's idle connection count on every
    /// membership read.
    pub fn watch_pool(&self, pool: DbPool) {
        *self.watched.lock().expect("watch lock") = Some(pool);
    }

    pub fn idle_seen(&self) -> Vec<u32> {
        self.idle_seen.lock().expect("idle lock").clone()
    }

    fn guard(&self) -> Result<(), LiveStateError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(refused());
        }
        Ok(())
    }
}

impl LiveStateStore for SwitchableLiveState {
    fn add_member(&self, event: EventId, p: ParticipantId) -> Result<bool, LiveStateError> {
        self.guard()?;
        self.inner.add_member(event, p)
    }

    fn remove_member(&self, event: EventId, p: ParticipantId) -> Result<bool, LiveStateError> {
        self.guard()?;
        self.inner.remove_member(event, p)
    }

    fn members(&self, event: EventId) -> Result<Vec<ParticipantId>, LiveStateError> {
        self.guard()?;
        if let Some(pool) = self.watched.lock().expect("watch lock").as_ref() {
            let idle = pool.state().idle_connections;
            self.idle_seen.lock().expect("idle lock").push(idle);
        }
        self.inner.members(event)
    }

    fn member_count(&self, event: EventId) -> Result<u64, LiveStateError> {
        self.guard()?;
        self.inner.member_count(event)
    }

    fn record_check_in(
        &self,
        event: EventId,
        p: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError> {
        self.guard()?;
        self.inner.record_check_in(event, p, timestamp)
    }

    fn record_check_out(
        &self,
        event: EventId,
        p: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError> {
        self.guard()?;
        self.inner.record_check_out(event, p, timestamp)
    }

    fn check_in_time(
        &self,
        event: EventId,
        p: ParticipantId,
    ) -> Result<Option<String>, LiveStateError> {
        self.guard()?;
        self.inner.check_in_time(event, p)
    }

    fn check_in_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError> {
        self.guard()?;
        self.inner.check_in_times(event)
    }

    fn check_out_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError> {
        self.guard()?;
        self.inner.check_out_times(event)
    }

    fn has_state(&self, event: EventId) -> Result<bool, LiveStateError> {
        self.guard()?;
        self.inner.has_state(event)
    }

    fn clear_event(&self, event: EventId) -> Result<(), LiveStateError> {
        self.guard()?;
        if self.clear_fails.load(Ordering::SeqCst) {
            return Err(refused());
        }
        self.inner.clear_event(event)
    }

    fn ping(&self) -> Result<(), LiveStateError> {
        self.guard()
    }
}

/// Memory schema store that can be switched off.
#[derive(Default)]
pub struct SwitchableSchemaStore {
    inner: MemorySchemaStore,
    down: AtomicBool,
}

impl SwitchableSchemaStore {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn guard(&self) -> Result<(), SchemaStoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SchemaStoreError::Poisoned);
        }
        Ok(())
    }
}

impl SchemaStore for SwitchableSchemaStore {
    fn put_event_type(&self, schema: &EventTypeSchema) -> Result<(), SchemaStoreError> {
        self.guard()?;
        self.inner.put_event_type(schema)
    }

    fn event_type(&self, type_id: EventTypeId) -> Result<Option<EventTypeSchema>, SchemaStoreError> {
        self.guard()?;
        self.inner.event_type(type_id)
    }

    fn event_types(&self) -> Result<Vec<EventTypeSchema>, SchemaStoreError> {
        self.guard()?;
        self.inner.event_types()
    }

    fn custom_data(&self, event_id: EventId) -> Result<Option<EventCustomData>, SchemaStoreError> {
        self.guard()?;
        self.inner.custom_data(event_id)
    }

    fn custom_data_many(
        &self,
        event_ids: &[EventId],
    ) -> Result<std::collections::HashMap<EventId, EventCustomData>, SchemaStoreError> {
        self.guard()?;
        self.inner.custom_data_many(event_ids)
    }

    fn upsert_custom_data(&self, data: &EventCustomData) -> Result<UpsertAction, SchemaStoreError> {
        self.guard()?;
        self.inner.upsert_custom_data(data)
    }

    fn ping(&self) -> Result<(), SchemaStoreError> {
        self.guard()
    }
}

/// A registry file plus switchable in-memory stores, wired into a service.
pub struct Harness {
    _dir: TempDir,
    pub pool: DbPool,
    pub live: Arc<SwitchableLiveState>,
    pub schema: Arc<SwitchableSchemaStore>,
    pub clock: Arc<ManualClock>,
    pub service: AttendanceService,
}

impl Harness {
    /// Registry with place 1, type 1 ("Weekly Youth Night", no schema
    /// document), event 42 of that type, and participants 7, 8 and 9 of
    /// whom 7 and 9 are registered for event 42.
    pub fn new() -> Self {
        Self::with_settings(DbRuntimeSettings::default())
    }

    /// Same seed as [`Harness::new`] over a registry pool built from
    /// `settings`.
    pub fn with_settings(settings: DbRuntimeSettings) -> Self {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("registry.db");
        let pool = create_pool(path.to_str().expect("utf-8 path"), settings)
            .expect("pool creation should succeed");
        {
            let conn = pool.get().expect("should get a connection");
            run_migrations(&conn).expect("migrations should succeed");
            conn.execute_batch(
                "INSERT INTO places (id, name) VALUES (1, 'Fellowship Hall');
                 INSERT INTO event_types (id, name) VALUES (1, 'Weekly Youth Night');
                 INSERT INTO events (id, name, event_type_id, place_id, start_date_time, end_date_time)
                     VALUES (42, 'Weekly Youth Night - Jan', 1, 1,
                             '2025-01-10T19:00:00', '2025-01-10T21:00:00');
                 INSERT INTO participants (id, first_name, last_name) VALUES
                     (7, 'Ada', 'Lovelace'), (8, 'Alan', 'Turing'), (9, 'Grace', 'Hopper');
                 INSERT INTO registrations (participant_id, event_id) VALUES (7, 42), (9, 42);",
            )
            .expect("seed should succeed");
        }

        let live = Arc::new(SwitchableLiveState::default());
        let schema = Arc::new(SwitchableSchemaStore::default());
        let clock = Arc::new(ManualClock::new(at(19, 2, 11)));
        let ctx = StoreContext::with_clock(
            pool.clone(),
            live.clone(),
            schema.clone(),
            clock.clone(),
        );

        Self {
            _dir: dir,
            pool,
            live,
            schema,
            clock,
            service: AttendanceService::new(ctx),
        }
    }

    pub fn sql(&self, batch: &str) {
        let conn = self.pool.get().expect("should get a connection");
        conn.execute_batch(batch).expect("sql should succeed");
    }
}
