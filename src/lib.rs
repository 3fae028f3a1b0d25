//! blobcache: bounded, identity-guarded cache for strings materialized from
//! blob content.
//!
//! See `DESIGN.md` for module layout and invariants.

pub mod blob_strings;
pub mod builder;
pub mod config;
pub mod ds;
pub mod error;
pub mod policy;
pub mod store;
pub mod traits;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
