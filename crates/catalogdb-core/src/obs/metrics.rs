use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{LazyLock, Mutex, MutexGuard, PoisonError},
    time::{SystemTime, UNIX_EPOCH},
};

///
/// EventState
/// Ephemeral, in-memory counters for store operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct EventState {
    pub(crate) ops: EventOps,
    pub(crate) entities: BTreeMap<String, EntityCounters>,
    pub(crate) since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            entities: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventOps {
    // Batches
    pub batches_committed: u64,
    pub batches_rejected: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,

    // Queries
    pub rows_scanned: u64,
    pub index_missing: u64,

    // Subscriptions
    pub subscriptions_opened: u64,
    pub subscriptions_shared: u64,
    pub subscriptions_closed: u64,
    pub snapshots_published: u64,

    // Relations
    pub dangling_references: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityCounters {
    pub batches_committed: u64,
    pub batches_rejected: u64,
    pub rows_inserted: u64,
    pub rows_updated: u64,
    pub rows_deleted: u64,
    pub rows_scanned: u64,
    pub index_missing: u64,
    pub subscriptions_opened: u64,
    pub subscriptions_closed: u64,
    pub snapshots_published: u64,
    pub dangling_references: u64,
}

///
/// EventReport
/// Point-in-time copy of the counters for endpoints and tests.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventReport {
    pub counters: EventOps,
    pub(crate) entities: BTreeMap<String, EntityCounters>,
    pub(crate) since_ms: u64,
}

impl EventReport {
    /// Counters of one collection, or zeroes if it never recorded anything.
    #[must_use]
    pub fn entity(&self, path: &str) -> EntityCounters {
        self.entities.get(path).cloned().unwrap_or_default()
    }
}

// Shared by every thread; commits made on worker threads count too.
static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

fn state() -> MutexGuard<'static, EventState> {
    EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    f(&mut state())
}

/// Borrow the counters of one collection, creating them on first use.
pub(crate) fn with_entity_mut<R>(
    state: &mut EventState,
    path: &str,
    f: impl FnOnce(&mut EntityCounters) -> R,
) -> R {
    f(state.entities.entry(path.to_string()).or_default())
}

pub(crate) fn report() -> EventReport {
    let state = state();

    EventReport {
        counters: state.ops.clone(),
        entities: state.entities.clone(),
        since_ms: state.since_ms,
    }
}

/// Reset all counters (useful in tests).
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}
