//! # Metrics Traits
//!
//! Recording lives inside the store (atomic counters). These traits cover the
//! consumption side, split so that tests can read snapshots without caring
//! how production publishes them.
//!
//! ```text
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │───►│ MetricsExporter<S>           │
//!   │ (store, cache)               │    │ (Prometheus text, ...)       │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Produce a point-in-time snapshot of metrics.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Publish a snapshot to a monitoring system.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
