//! Market document parsing
//!
//! Turns one raw XML document into a lazy stream of flat [`Record`]s:
//!
//! - [`schema`] - tag contract table per category
//! - [`reader`] - streaming reader and [`RecordStream`]
//! - [`stats`] - skip reasons, counters and document headers
//!
//! [`Record`]: crate::domain::Record

pub mod reader;
pub mod schema;
pub mod stats;

pub use reader::{parse_document, ParseContext, RecordStream};
pub use schema::{DocumentSchema, GENERATION_SCHEMA, PRICES_SCHEMA};
pub use stats::{DocumentHeader, ParseStats, SkipReason};
