//! Store handles and the clock shared by every attendance component.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use rollcall_db::DbPool;
use rollcall_live::LiveStateStore;
use rollcall_schema::SchemaStore;

use crate::AttendanceError;

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Handles to the registry pool, the live state store, the schema store
/// and the clock.
///
/// Cloning is cheap: the pool and the trait objects are reference counted.
#[derive(Clone)]
pub struct StoreContext {
    pub registry: DbPool,
    pub live: Arc<dyn LiveStateStore>,
    pub schema: Arc<dyn SchemaStore>,
    pub clock: Arc<dyn Clock>,
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("registry_max_size", &self.registry.max_size())
            .finish_non_exhaustive()
    }
}

impl StoreContext {
    /// Bundles the stores with the system clock.
    pub fn new(
        registry: DbPool,
        live: Arc<dyn LiveStateStore>,
        schema: Arc<dyn SchemaStore>,
    ) -> Self {
        Self::with_clock(registry, live, schema, Arc::new(SystemClock))
    }

    /// Bundles the stores with an explicit clock.
    pub fn with_clock(
        registry: DbPool,
        live: Arc<dyn LiveStateStore>,
        schema: Arc<dyn SchemaStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            live,
            schema,
            clock,
        }
    }

    /// Checks a connection out of the registry pool and runs `f` with it.
    ///
    /// The connection goes back to the pool before this returns, so callers
    /// never hold it across live state or schema store calls.
    pub(crate) fn with_registry<T>(
        &self,
        f: impl FnOnce(&rusqlite::Connection) -> Result<T, AttendanceError>,
    ) -> Result<T, AttendanceError> {
        let conn = self.registry.get()?;
        f(&conn)
    }
}
