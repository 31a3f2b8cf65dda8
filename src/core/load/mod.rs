//! Idempotent persistence of enriched partitions
//!
//! - [`policy`] - conflict policy and destination table layout
//! - [`loader`] - collapses duplicates and drives a record store

pub mod loader;
pub mod policy;

pub use loader::{Loader, LoaderSettings, UpsertOutcome};
pub use policy::{ConflictPolicy, TableSpec};
