//! Core ETL logic
//!
//! # Modules
//!
//! - [`parse`] - market documents to flat records
//! - [`reference`] - country and production-type lookup tables
//! - [`enrich`] - reference joins and per-category output rows
//! - [`load`] - idempotent upserts through a record store
//! - [`validate`] - structural sanity checks on partitions
//! - [`pipeline`] - stage runners and summaries
//!
//! # Workflow
//!
//! For one (category, date) partition:
//!
//! 1. **Parse**: every `raw_<COUNTRY>.xml` becomes `parsed_<category>.csv`
//! 2. **Enrich**: parsed records joined to the reference tables become
//!    `enriched_<category>.csv`
//! 3. **Load**: enriched rows are upserted on their natural key
//!
//! ```rust,no_run
//! use entsoe_etl::adapters::files::PartitionLayout;
//! use entsoe_etl::core::pipeline::{run_parse, RunContext};
//! use entsoe_etl::domain::{Category, Partition};
//! use chrono::NaiveDate;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = RunContext::new(PartitionLayout::new("data"));
//! let partition = Partition::new(Category::Generation, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap());
//! let summary = run_parse(&ctx, &partition)?;
//! summary.log_summary();
//! # Ok(())
//! # }
//! ```

pub mod enrich;
pub mod load;
pub mod parse;
pub mod pipeline;
pub mod reference;
pub mod validate;
