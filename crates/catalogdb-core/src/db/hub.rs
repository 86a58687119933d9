//! Module: db::hub
//! Responsibility: shared live subscriptions, one per distinct query.
//! Does not own: query validation (done before a plan reaches the hub) or
//! row storage.
//! Boundary: consumers of the same (ordering, predicate) share one watch
//! channel; the entry is dropped when its last handle cancels.

use crate::{
    db::{DataStore, Record},
    error::CatalogError,
    obs::sink::{MetricsEvent, record},
    query::plan::QueryPlan,
    traits::EntityKind,
};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use tokio::sync::watch;
use tracing::debug;

///
/// Snapshot
///
/// Complete result set of one subscription at a collection revision.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot<E> {
    pub revision: u64,
    pub items: Arc<Vec<Record<E>>>,
}

impl<E> Snapshot<E> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
struct HubEntry<E> {
    sender: watch::Sender<Snapshot<E>>,
    handles: usize,
}

///
/// SubscriptionHub
///

#[derive(Debug)]
pub struct SubscriptionHub<E: EntityKind> {
    entries: Mutex<BTreeMap<QueryPlan, HubEntry<E>>>,
}

impl<E: EntityKind> Default for SubscriptionHub<E> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<E: EntityKind> SubscriptionHub<E> {
    fn entries(&self) -> MutexGuard<'_, BTreeMap<QueryPlan, HubEntry<E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a handle to the entry for `plan`, creating it from `rows` if
    /// this is the first consumer.
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        plan: QueryPlan,
        rows: &DataStore<E>,
        revision: u64,
    ) -> Subscription<E> {
        let mut entries = self.entries();
        let shared = entries.contains_key(&plan);

        let rx = if let Some(entry) = entries.get_mut(&plan) {
            entry.handles += 1;
            entry.sender.subscribe()
        } else {
            let snapshot = Snapshot {
                revision,
                items: Arc::new(plan.execute(rows)),
            };
            let (sender, rx) = watch::channel(snapshot);
            entries.insert(plan.clone(), HubEntry { sender, handles: 1 });
            rx
        };
        drop(entries);

        record(MetricsEvent::SubscriptionOpened {
            entity_path: plan.collection,
            shared,
        });
        debug!(
            collection = plan.collection,
            order = plan.order,
            shared,
            "subscription opened"
        );

        Subscription {
            inner: Inner::Live {
                plan,
                rx,
                hub: Arc::downgrade(self),
                primed: false,
            },
        }
    }

    /// Recompute every registered query. Consumers are woken only when
    /// their result set actually changed.
    pub(crate) fn publish(&self, rows: &DataStore<E>, revision: u64) {
        let entries = self.entries();

        for (plan, entry) in entries.iter() {
            let items = plan.execute(rows);
            let len = items.len();

            let modified = entry.sender.send_if_modified(|current| {
                if *current.items == items {
                    current.revision = revision;
                    return false;
                }
                *current = Snapshot {
                    revision,
                    items: Arc::new(items),
                };
                true
            });

            if modified {
                record(MetricsEvent::SnapshotPublished {
                    entity_path: plan.collection,
                    rows: len as u64,
                });
            }
        }
    }

    fn release(&self, plan: &QueryPlan) {
        let mut entries = self.entries();
        let Some(entry) = entries.get_mut(plan) else {
            return;
        };

        entry.handles = entry.handles.saturating_sub(1);
        if entry.handles == 0 {
            entries.remove(plan);
        }
    }

    /// Number of distinct queries with at least one live handle.
    #[must_use]
    pub fn active_queries(&self) -> usize {
        self.entries().len()
    }

    /// Total live handles across all queries.
    #[must_use]
    pub fn active_handles(&self) -> usize {
        self.entries().values().map(|entry| entry.handles).sum()
    }
}

///
/// SubscriptionState
///

#[derive(Clone, Debug)]
pub enum SubscriptionState {
    Active,
    Failed(CatalogError),
    Cancelled,
}

///
/// Subscription
///
/// One consumer's handle on a live query. Dropping the handle cancels it.
///

#[derive(Debug)]
pub struct Subscription<E: EntityKind> {
    inner: Inner<E>,
}

#[derive(Debug)]
enum Inner<E: EntityKind> {
    Live {
        plan: QueryPlan,
        rx: watch::Receiver<Snapshot<E>>,
        hub: Weak<SubscriptionHub<E>>,
        primed: bool,
    },
    Failed {
        error: CatalogError,
        delivered: bool,
    },
    Cancelled,
}

impl<E: EntityKind> Subscription<E> {
    /// A subscription that was never registered. Its only item is `error`.
    pub(crate) const fn failed(error: CatalogError) -> Self {
        Self {
            inner: Inner::Failed {
                error,
                delivered: false,
            },
        }
    }

    #[must_use]
    pub fn state(&self) -> SubscriptionState {
        match &self.inner {
            Inner::Live { .. } => SubscriptionState::Active,
            Inner::Failed { error, .. } => SubscriptionState::Failed(error.clone()),
            Inner::Cancelled => SubscriptionState::Cancelled,
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.inner, Inner::Live { .. })
    }

    #[must_use]
    pub const fn error(&self) -> Option<&CatalogError> {
        match &self.inner {
            Inner::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Current snapshot without waiting. `None` unless active.
    #[must_use]
    pub fn latest(&self) -> Option<Snapshot<E>> {
        match &self.inner {
            Inner::Live { rx, .. } => Some(rx.borrow().clone()),
            _ => None,
        }
    }

    /// Next item of the stream.
    ///
    /// The first call on an active subscription yields the current snapshot
    /// immediately; later calls wait for a changed result set. A failed
    /// subscription yields its error once. Ends with `None` after cancel.
    pub async fn next(&mut self) -> Option<Result<Snapshot<E>, CatalogError>> {
        match &mut self.inner {
            Inner::Live { rx, primed, .. } => {
                if *primed {
                    rx.changed().await.ok()?;
                }
                *primed = true;

                Some(Ok(rx.borrow_and_update().clone()))
            }
            Inner::Failed { error, delivered } => {
                if *delivered {
                    return None;
                }
                *delivered = true;

                Some(Err(error.clone()))
            }
            Inner::Cancelled => None,
        }
    }

    /// Release this handle. Idempotent.
    pub fn cancel(&mut self) {
        let inner = std::mem::replace(&mut self.inner, Inner::Cancelled);

        if let Inner::Live { plan, rx, hub, .. } = inner {
            drop(rx);
            if let Some(hub) = hub.upgrade() {
                hub.release(&plan);
            }

            record(MetricsEvent::SubscriptionClosed {
                entity_path: plan.collection,
            });
            debug!(
                collection = plan.collection,
                order = plan.order,
                "subscription cancelled"
            );
        }
    }
}

impl<E: EntityKind> Drop for Subscription<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}
