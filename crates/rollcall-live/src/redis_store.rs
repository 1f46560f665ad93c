//! Redis-backed live state.
//!
//! Connections come from an `r2d2` pool over [`redis::Client`], so the
//! blocking call pattern matches the registry pool: check out, run one
//! command, return.

use std::collections::HashMap;
use std::time::Duration;

use redis::Commands;
use rollcall_types::{EventId, ParticipantId};

use crate::keys::EventKeys;
use crate::store::{LiveStateStore, ParticipantTimes};
use crate::LiveStateError;

/// Pool tunables for the Redis backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedisRuntimeSettings {
    /// Maximum number of pooled Redis connections.
    pub pool_max_size: u32,
    /// How long a checkout waits for a connection, in milliseconds.
    pub connection_timeout_ms: u64,
}

impl Default for RedisRuntimeSettings {
    fn default() -> Self {
        Self {
            pool_max_size: 16,
            connection_timeout_ms: 2_000,
        }
    }
}

/// Live state stored in Redis sets and hashes.
#[derive(Clone)]
pub struct RedisLiveState {
    pool: r2d2::Pool<redis::Client>,
}

impl std::fmt::Debug for RedisLiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLiveState")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl RedisLiveState {
    /// Creates a pooled client for `redis_url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// The pool is built without opening connections, so an unreachable
    /// server surfaces later as [`LiveStateError::Pool`] on the first
    /// operation rather than preventing startup.
    ///
    /// # Errors
    ///
    /// Returns `LiveStateError::Command` if the URL cannot be parsed.
    pub fn connect(
        redis_url: &str,
        settings: RedisRuntimeSettings,
    ) -> Result<Self, LiveStateError> {
        let client = redis::Client::open(redis_url)?;
        let pool = r2d2::Pool::builder()
            .max_size(settings.pool_max_size)
            .min_idle(Some(0))
            .connection_timeout(Duration::from_millis(settings.connection_timeout_ms))
            .build_unchecked(client);

        tracing::debug!(
            max_size = settings.pool_max_size,
            "redis live state pool created"
        );

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<r2d2::PooledConnection<redis::Client>, LiveStateError> {
        Ok(self.pool.get()?)
    }
}

/// Parses stored participant ids, dropping anything that is not an integer.
fn parse_participant(raw: &str, key: &str) -> Option<ParticipantId> {
    match raw.parse::<i64>() {
        Ok(id) => Some(ParticipantId(id)),
        Err(_) => {
            tracing::warn!(key, value = raw, "ignoring non-numeric participant id in live state");
            None
        }
    }
}

/// Parses the checked-in set into sorted participant ids.
fn parse_members(raw: Vec<String>, key: &str) -> Vec<ParticipantId> {
    let mut members: Vec<ParticipantId> = raw
        .iter()
        .filter_map(|m| parse_participant(m, key))
        .collect();
    members.sort();
    members
}

fn parse_times(raw: HashMap<String, String>, key: &str) -> ParticipantTimes {
    raw.into_iter()
        .filter_map(|(field, ts)| parse_participant(&field, key).map(|id| (id, ts)))
        .collect()
}

impl LiveStateStore for RedisLiveState {
    fn add_member(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<bool, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let added: i64 = conn.sadd(keys.checked_in.as_str(), participant.get())?;
        Ok(added > 0)
    }

    fn remove_member(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<bool, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let removed: i64 = conn.srem(keys.checked_in.as_str(), participant.get())?;
        Ok(removed > 0)
    }

    fn members(&self, event: EventId) -> Result<Vec<ParticipantId>, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let raw: Vec<String> = conn.smembers(keys.checked_in.as_str())?;
        Ok(parse_members(raw, &keys.checked_in))
    }

    // Counted from the parsed members rather than SCARD so that a foreign
    // value in the set cannot make the count disagree with `members`.
    fn member_count(&self, event: EventId) -> Result<u64, LiveStateError> {
        Ok(self.members(event)?.len() as u64)
    }

    fn record_check_in(
        &self,
        event: EventId,
        participant: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let _: i64 = conn.hset(keys.check_in_times.as_str(), participant.get(), timestamp)?;
        Ok(())
    }

    fn record_check_out(
        &self,
        event: EventId,
        participant: ParticipantId,
        timestamp: &str,
    ) -> Result<(), LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let _: i64 = conn.hset(keys.check_out_times.as_str(), participant.get(), timestamp)?;
        Ok(())
    }

    fn check_in_time(
        &self,
        event: EventId,
        participant: ParticipantId,
    ) -> Result<Option<String>, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        Ok(conn.hget(keys.check_in_times.as_str(), participant.get())?)
    }

    fn check_in_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let raw: HashMap<String, String> = conn.hgetall(keys.check_in_times.as_str())?;
        Ok(parse_times(raw, &keys.check_in_times))
    }

    fn check_out_times(&self, event: EventId) -> Result<ParticipantTimes, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let raw: HashMap<String, String> = conn.hgetall(keys.check_out_times.as_str())?;
        Ok(parse_times(raw, &keys.check_out_times))
    }

    fn has_state(&self, event: EventId) -> Result<bool, LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        let existing: u64 = conn.exists(&keys.all()[..])?;
        Ok(existing > 0)
    }

    fn clear_event(&self, event: EventId) -> Result<(), LiveStateError> {
        let keys = EventKeys::for_event(event);
        let mut conn = self.conn()?;
        // One DEL for all three keys; Redis applies it atomically.
        let deleted: u64 = conn.del(&keys.all()[..])?;
        tracing::debug!(event_id = %event, deleted, "cleared live state keys");
        Ok(())
    }

    fn ping(&self) -> Result<(), LiveStateError> {
        let mut conn = self.conn()?;
        let _: String = redis::cmd("PING").query(&mut *conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_members_sorts_and_drops_foreign_values() {
        let raw = vec!["9".to_string(), "seven".to_string(), "7".to_string()];
        let members = parse_members(raw, "event:42:checkedIn");
        assert_eq!(members, vec![ParticipantId(7), ParticipantId(9)]);
    }

    #[test]
    fn parse_times_drops_malformed_fields() {
        let raw = HashMap::from([
            ("7".to_string(), "2025-01-10T19:02:11".to_string()),
            ("seven".to_string(), "2025-01-10T19:03:00".to_string()),
        ]);
        let parsed = parse_times(raw, "event:42:checkInTimes");
        assert_eq!(parsed.len(), 1);
        assert_eq!(
            parsed.get(&ParticipantId(7)).map(String::as_str),
            Some("2025-01-10T19:02:11")
        );
    }

    #[test]
    fn connect_rejects_malformed_url() {
        let err = RedisLiveState::connect("not a url", RedisRuntimeSettings::default())
            .expect_err("malformed url should fail");
        assert!(matches!(err, LiveStateError::Command(_)));
    }

    #[test]
    fn unreachable_server_surfaces_as_pool_error() {
        let store = RedisLiveState::connect(
            "redis://127.0.0.1:1/",
            RedisRuntimeSettings {
                pool_max_size: 1,
                connection_timeout_ms: 200,
            },
        )
        .expect("pool should build without connecting");

        let err = store
            .member_count(EventId(1))
            .expect_err("no server listens on port 1");
        assert!(matches!(err, LiveStateError::Pool(_)));
    }
}
