//! Observability for the soft cache: snapshots and exporters.
//!
//! Hit-rate counters are always maintained by
//! [`SoftLongCache`](crate::store::soft::SoftLongCache); this module only adds
//! the read side (snapshot types and export).

pub mod exporter;
pub mod snapshot;
pub mod traits;
