//! Record store abstraction
//!
//! The loader talks to a [`RecordStore`]; PostgreSQL and an in-process
//! store implement it with the same conflict semantics.

use crate::core::load::{ConflictPolicy, TableSpec};
use crate::domain::{GenerationRow, PriceRow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Rows affected by one partition write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteCounts {
    /// Keys that did not exist before
    pub inserted: usize,

    /// Existing keys whose mutable columns changed
    pub updated: usize,

    /// Statements submitted
    pub batches: usize,
}

/// Summary of one destination table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: String,
    pub rows: u64,
    pub latest_point: Option<DateTime<Utc>>,
}

/// Destination of enriched rows
///
/// Each upsert call covers one partition and is atomic: either every batch
/// is committed or none is.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Verifies the store is reachable
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::EtlError::Connection`] when it is not.
    async fn test_connection(&self) -> Result<()>;

    /// Creates the destination tables and their uniqueness constraints if
    /// they do not exist
    async fn ensure_schema(&self, tables: &[TableSpec]) -> Result<()>;

    /// Upserts generation rows in chunks of `batch_size`
    async fn upsert_generation(
        &self,
        spec: &TableSpec,
        rows: &[GenerationRow],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts>;

    /// Upserts price rows in chunks of `batch_size`
    async fn upsert_prices(
        &self,
        spec: &TableSpec,
        rows: &[PriceRow],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts>;

    /// Row count and most recent point of a table
    async fn table_status(&self, spec: &TableSpec) -> Result<TableStatus>;
}
