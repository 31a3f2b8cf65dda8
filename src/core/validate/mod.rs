//! Structural sanity checks on partitions

pub mod checks;
pub mod report;

pub use checks::{validate_enriched, validate_parsed};
pub use report::{Check, ValidationIssue, ValidationReport};
