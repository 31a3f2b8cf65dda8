//! Domain models and types for entsoe-etl.
//!
//! This module contains the core domain types shared by every stage.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed codes** ([`CountryCode`], [`BiddingZone`], [`PsrType`])
//! - **Record shapes** ([`Record`], [`GenerationRow`], [`PriceRow`])
//! - **Partition identity** ([`Partition`], [`Category`])
//! - **Error type** ([`EtlError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible library operations return [`Result<T, EtlError>`]:
//!
//! ```rust
//! use entsoe_etl::domain::{Category, Result};
//!
//! fn example() -> Result<Category> {
//!     let category: Category = "generation".parse()?;
//!     Ok(category)
//! }
//! # example().unwrap();
//! ```

pub mod category;
pub mod errors;
pub mod ids;
pub mod partition;
pub mod record;
pub mod result;
pub mod time;

// Re-export commonly used types for convenience
pub use category::Category;
pub use errors::EtlError;
pub use ids::{BiddingZone, CountryCode, PsrType};
pub use partition::Partition;
pub use record::{EnrichedBatch, EnrichedRow, GenerationRow, NaturalKey, PriceRow, Record};
pub use result::Result;
pub use time::{resolve_target_date, Resolution};
