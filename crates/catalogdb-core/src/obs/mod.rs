//! Observability: in-process metrics counters and the sink abstraction.
//!
//! This module never reads collection state. `db` and `query` report what
//! they did through `MetricsEvent`; nothing else writes the counters.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntityCounters, EventOps, EventReport};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
