// entsoe-etl - ENTSO-E energy data ETL
// Copyright (c) 2025 entsoe-etl Contributors
// Licensed under the MIT License

//! # entsoe-etl
//!
//! Batch ETL for ENTSO-E Transparency Platform market documents: per-country,
//! per-day XML time series (generation per production type and day-ahead
//! prices) become a deduplicated relational dataset.
//!
//! ## Overview
//!
//! - **Parsing** XML documents into flat records, tolerant of namespace and
//!   tag drift between document revisions
//! - **Enriching** records with country and production-type reference tables
//! - **Loading** rows into PostgreSQL on a natural key so reruns converge
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Parser, reference resolver, enricher, loader, validator and
//!   stage runners
//! - [`adapters`] - Partition files and record stores (PostgreSQL, memory)
//! - [`domain`] - Records, identifiers, time handling and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use entsoe_etl::adapters::database::create_record_store;
//! use entsoe_etl::adapters::files::PartitionLayout;
//! use entsoe_etl::config::load_config;
//! use entsoe_etl::core::load::{Loader, LoaderSettings};
//! use entsoe_etl::core::pipeline::{run_categories, RunContext};
//! use entsoe_etl::core::reference::ReferenceResolver;
//! use chrono::NaiveDate;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("entsoe-etl.toml")?;
//!     let resolver = Arc::new(ReferenceResolver::from_csv_files(
//!         &config.reference.countries_path,
//!         &config.reference.production_types_path,
//!     )?);
//!     let loader = Loader::new(
//!         create_record_store(&config).await?,
//!         LoaderSettings::from_config(&config),
//!     );
//!     loader.prepare().await?;
//!
//!     let ctx = RunContext::new(PartitionLayout::new(&config.storage.data_root));
//!     let date = NaiveDate::from_ymd_opt(2026, 1, 27).unwrap();
//!     for run in run_categories(&ctx, resolver, &loader, &config.pipeline.categories, date).await {
//!         for summary in run.result? {
//!             summary.log_summary();
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], an alias over
//! [`domain::EtlError`]. Fatal errors raised inside a stage are wrapped with
//! the stage and partition they aborted, and map onto process exit codes
//! through [`domain::EtlError::exit_code`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
