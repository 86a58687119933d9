//! Metrics sink boundary.
//!
//! Store and query code never touch `obs::metrics` directly. All
//! instrumentation flows through `MetricsEvent` and `record`.

use crate::obs::metrics::{self, EventReport};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    BatchCommitted {
        entity_path: &'static str,
        inserts: u64,
        updates: u64,
        deletes: u64,
    },
    BatchRejected {
        entity_path: &'static str,
    },
    RowsScanned {
        entity_path: &'static str,
        rows_scanned: u64,
    },
    IndexMissing {
        entity_path: &'static str,
    },
    SubscriptionOpened {
        entity_path: &'static str,
        shared: bool,
    },
    SubscriptionClosed {
        entity_path: &'static str,
    },
    SnapshotPublished {
        entity_path: &'static str,
        rows: u64,
    },
    DanglingReferences {
        entity_path: &'static str,
        dangling: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// Default sink writing into the process-wide counter state. Used whenever
/// the current thread has no scoped override installed.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::BatchCommitted {
                entity_path,
                inserts,
                updates,
                deletes,
            } => {
                m.ops.batches_committed = m.ops.batches_committed.saturating_add(1);
                m.ops.rows_inserted = m.ops.rows_inserted.saturating_add(inserts);
                m.ops.rows_updated = m.ops.rows_updated.saturating_add(updates);
                m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(deletes);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.batches_committed = entry.batches_committed.saturating_add(1);
                    entry.rows_inserted = entry.rows_inserted.saturating_add(inserts);
                    entry.rows_updated = entry.rows_updated.saturating_add(updates);
                    entry.rows_deleted = entry.rows_deleted.saturating_add(deletes);
                });
            }

            MetricsEvent::BatchRejected { entity_path } => {
                m.ops.batches_rejected = m.ops.batches_rejected.saturating_add(1);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.batches_rejected = entry.batches_rejected.saturating_add(1);
                });
            }

            MetricsEvent::RowsScanned {
                entity_path,
                rows_scanned,
            } => {
                m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::IndexMissing { entity_path } => {
                m.ops.index_missing = m.ops.index_missing.saturating_add(1);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.index_missing = entry.index_missing.saturating_add(1);
                });
            }

            MetricsEvent::SubscriptionOpened {
                entity_path,
                shared,
            } => {
                m.ops.subscriptions_opened = m.ops.subscriptions_opened.saturating_add(1);
                if shared {
                    m.ops.subscriptions_shared = m.ops.subscriptions_shared.saturating_add(1);
                }
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.subscriptions_opened = entry.subscriptions_opened.saturating_add(1);
                });
            }

            MetricsEvent::SubscriptionClosed { entity_path } => {
                m.ops.subscriptions_closed = m.ops.subscriptions_closed.saturating_add(1);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.subscriptions_closed = entry.subscriptions_closed.saturating_add(1);
                });
            }

            MetricsEvent::SnapshotPublished { entity_path, .. } => {
                m.ops.snapshots_published = m.ops.snapshots_published.saturating_add(1);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.snapshots_published = entry.snapshots_published.saturating_add(1);
                });
            }

            MetricsEvent::DanglingReferences {
                entity_path,
                dangling,
            } => {
                m.ops.dangling_references = m.ops.dangling_references.saturating_add(dangling);
                metrics::with_entity_mut(m, entity_path, |entry| {
                    entry.dangling_references = entry.dangling_references.saturating_add(dangling);
                });
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    // Clone the override out so a sink that records again does not hit an
    // outstanding borrow.
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the process-wide metrics counters.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

/// Reset all metrics counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override on this thread.
///
/// The previous sink is restored on every exit, including unwinding.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}
