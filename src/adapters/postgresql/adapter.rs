//! PostgreSQL implementation of [`RecordStore`]

use crate::adapters::database::traits::{RecordStore, TableStatus, WriteCounts};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{PgGenerationRow, PgPriceRow, PgRow};
use crate::adapters::postgresql::sql::{render_schema, render_status, render_upsert};
use crate::core::load::{ConflictPolicy, TableSpec};
use crate::domain::{EtlError, GenerationRow, PriceRow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// Record store writing to PostgreSQL
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    /// Writes every chunk inside one transaction
    async fn upsert_rows<P: PgRow>(
        &self,
        spec: &TableSpec,
        rows: &[P],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts> {
        let mut counts = WriteCounts::default();
        if rows.is_empty() {
            return Ok(counts);
        }

        let mut connection = self.client.get_connection().await?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|e| EtlError::Database(format!("Failed to begin transaction: {}", e)))?;
        transaction
            .batch_execute(&self.client.statement_timeout_sql())
            .await
            .map_err(|e| EtlError::Database(format!("Failed to set statement timeout: {}", e)))?;

        let total_batches = rows.len().div_ceil(batch_size.max(1));
        for (index, chunk) in rows.chunks(batch_size.max(1)).enumerate() {
            crate::log_batch_processing!(index + 1, total_batches);
            let statement = render_upsert(spec, chunk.len(), policy);
            let params: Vec<&(dyn ToSql + Sync)> =
                chunk.iter().flat_map(|row| row.params()).collect();

            let returned = transaction.query(&statement, &params).await.map_err(|e| {
                tracing::error!(
                    table = %spec.table,
                    batch = index,
                    rows = chunk.len(),
                    error = %e,
                    "Upsert batch failed, rolling back partition"
                );
                EtlError::Database(format!("Upsert into {} failed: {}", spec.table, e))
            })?;

            for row in returned {
                let inserted: bool = row.try_get(0).map_err(|e| {
                    EtlError::Database(format!("Unexpected upsert result: {}", e))
                })?;
                if inserted {
                    counts.inserted += 1;
                } else {
                    counts.updated += 1;
                }
            }
            counts.batches += 1;
        }

        transaction
            .commit()
            .await
            .map_err(|e| EtlError::Database(format!("Failed to commit {}: {}", spec.table, e)))?;
        Ok(counts)
    }
}

#[async_trait]
impl RecordStore for PostgreSQLAdapter {
    fn name(&self) -> &str {
        "postgresql"
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self, tables: &[TableSpec]) -> Result<()> {
        let ddl = render_schema(tables)?;
        let connection = self.client.get_connection().await?;
        connection
            .batch_execute(&ddl)
            .await
            .map_err(|e| EtlError::Database(format!("Failed to execute migration: {}", e)))?;

        tracing::info!(
            tables = ?tables.iter().map(|t| t.table.as_str()).collect::<Vec<_>>(),
            "PostgreSQL schema ensured"
        );
        Ok(())
    }

    async fn upsert_generation(
        &self,
        spec: &TableSpec,
        rows: &[GenerationRow],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts> {
        let rows = rows
            .iter()
            .map(PgGenerationRow::from_domain)
            .collect::<Result<Vec<_>>>()?;
        self.upsert_rows(spec, &rows, policy, batch_size).await
    }

    async fn upsert_prices(
        &self,
        spec: &TableSpec,
        rows: &[PriceRow],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts> {
        let rows = rows
            .iter()
            .map(PgPriceRow::from_domain)
            .collect::<Result<Vec<_>>>()?;
        self.upsert_rows(spec, &rows, policy, batch_size).await
    }

    async fn table_status(&self, spec: &TableSpec) -> Result<TableStatus> {
        let connection = self.client.get_connection().await?;
        let row = connection
            .query_one(&render_status(spec), &[])
            .await
            .map_err(|e| EtlError::Database(format!("Status query on {} failed: {}", spec.table, e)))?;

        let rows: i64 = row
            .try_get("row_count")
            .map_err(|e| EtlError::Database(format!("Unexpected status result: {}", e)))?;
        let latest_point: Option<DateTime<Utc>> = row
            .try_get("latest_point")
            .map_err(|e| EtlError::Database(format!("Unexpected status result: {}", e)))?;

        Ok(TableStatus {
            table: spec.table.clone(),
            rows: rows.max(0) as u64,
            latest_point,
        })
    }
}
