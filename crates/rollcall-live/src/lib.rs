//! Ephemeral live attendance state.
//!
//! While an event is active, check-in membership and visit timestamps live
//! in a fast key-value store rather than the registry. Per event there are
//! three keys:
//!
//! | Key | Kind | Contents |
//! |-----|------|----------|
//! | `event:{id}:checkedIn` | set | participant ids currently present |
//! | `event:{id}:checkInTimes` | hash | participant id → ISO-8601 check-in |
//! | `event:{id}:checkOutTimes` | hash | participant id → ISO-8601 check-out |
//!
//! No expiry is set on any key; they persist until finalization clears
//! them.
//!
//! [`LiveStateStore`] is the seam. [`RedisLiveState`] is the production
//! backend; [`MemoryLiveState`] keeps the same semantics in process and is
//! used by tests and single-node deployments.

mod error;
mod keys;
mod memory;
mod redis_store;
mod store;

pub use error::LiveStateError;
pub use keys::EventKeys;
pub use memory::MemoryLiveState;
pub use redis_store::{RedisLiveState, RedisRuntimeSettings};
pub use store::{LiveStateStore, ParticipantTimes};
