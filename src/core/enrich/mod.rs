//! Enrichment of parsed records
//!
//! - [`enricher`] - joins records to the reference tables
//! - [`fields`] - output columns and their precedence

pub mod enricher;
pub mod fields;

pub use enricher::{Enricher, Enrichment, UnresolvedCounts, UNKNOWN};
pub use fields::{fields_for, joined_tables, FieldSource, OutputField};
