//! External system integrations
//!
//! - [`files`] - date-partitioned raw, parsed and enriched artifacts
//! - [`database`] - record store abstraction and factory
//! - [`postgresql`] - PostgreSQL record store
//!
//! Stores sit behind the [`database::RecordStore`] trait so the loader and
//! the pipeline can run against [`database::MemoryStore`] in tests.

pub mod database;
pub mod files;
pub mod postgresql;
