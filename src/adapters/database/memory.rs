//! In-process record store
//!
//! Keeps rows in ordered maps keyed by natural key. Writing to a table that
//! [`RecordStore::ensure_schema`] has not created fails, as it would on a
//! relational store.

use crate::adapters::database::traits::{RecordStore, TableStatus, WriteCounts};
use crate::core::load::{ConflictPolicy, TableSpec};
use crate::domain::{Category, EnrichedRow, EtlError, GenerationRow, NaturalKey, PriceRow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug)]
enum MemoryTable {
    Generation(BTreeMap<NaturalKey, GenerationRow>),
    Prices(BTreeMap<NaturalKey, PriceRow>),
}

impl MemoryTable {
    fn len(&self) -> usize {
        match self {
            MemoryTable::Generation(rows) => rows.len(),
            MemoryTable::Prices(rows) => rows.len(),
        }
    }
}

/// Record store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, MemoryTable>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the generation rows stored in `table`, ordered by key
    pub async fn generation_rows(&self, table: &str) -> Vec<GenerationRow> {
        match self.tables.read().await.get(table) {
            Some(MemoryTable::Generation(rows)) => rows.values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Copy of the price rows stored in `table`, ordered by key
    pub async fn price_rows(&self, table: &str) -> Vec<PriceRow> {
        match self.tables.read().await.get(table) {
            Some(MemoryTable::Prices(rows)) => rows.values().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

fn missing_table(table: &str) -> EtlError {
    EtlError::Database(format!("relation \"{table}\" does not exist"))
}

/// Applies `rows` to `table` in batches of `batch_size`
fn upsert_into<R: EnrichedRow + PartialEq>(
    table: &mut BTreeMap<NaturalKey, R>,
    rows: &[R],
    policy: ConflictPolicy,
    batch_size: usize,
) -> WriteCounts {
    let mut counts = WriteCounts::default();

    for chunk in rows.chunks(batch_size.max(1)) {
        counts.batches += 1;
        for row in chunk {
            match table.get_mut(&row.natural_key()) {
                None => {
                    table.insert(row.natural_key(), row.clone());
                    counts.inserted += 1;
                }
                Some(existing) => {
                    if policy == ConflictPolicy::Update && existing != row {
                        *existing = row.clone();
                        counts.updated += 1;
                    }
                }
            }
        }
    }

    counts
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self, tables: &[TableSpec]) -> Result<()> {
        let mut guard = self.tables.write().await;
        for spec in tables {
            guard
                .entry(spec.table.clone())
                .or_insert_with(|| match spec.category {
                    Category::Generation => MemoryTable::Generation(BTreeMap::new()),
                    Category::Prices => MemoryTable::Prices(BTreeMap::new()),
                });
        }
        Ok(())
    }

    async fn upsert_generation(
        &self,
        spec: &TableSpec,
        rows: &[GenerationRow],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts> {
        let mut guard = self.tables.write().await;
        match guard.get_mut(&spec.table) {
            Some(MemoryTable::Generation(current)) => {
                Ok(upsert_into(current, rows, policy, batch_size))
            }
            Some(MemoryTable::Prices(_)) => Err(EtlError::Database(format!(
                "table \"{}\" holds price rows",
                spec.table
            ))),
            None => Err(missing_table(&spec.table)),
        }
    }

    async fn upsert_prices(
        &self,
        spec: &TableSpec,
        rows: &[PriceRow],
        policy: ConflictPolicy,
        batch_size: usize,
    ) -> Result<WriteCounts> {
        let mut guard = self.tables.write().await;
        match guard.get_mut(&spec.table) {
            Some(MemoryTable::Prices(current)) => {
                Ok(upsert_into(current, rows, policy, batch_size))
            }
            Some(MemoryTable::Generation(_)) => Err(EtlError::Database(format!(
                "table \"{}\" holds generation rows",
                spec.table
            ))),
            None => Err(missing_table(&spec.table)),
        }
    }

    async fn table_status(&self, spec: &TableSpec) -> Result<TableStatus> {
        let guard = self.tables.read().await;
        let table = guard.get(&spec.table).ok_or_else(|| missing_table(&spec.table))?;
        let latest_point = match table {
            MemoryTable::Generation(rows) => rows.values().filter_map(|r| r.timestamp()).max(),
            MemoryTable::Prices(rows) => rows.values().filter_map(|r| r.timestamp()).max(),
        };
        Ok(TableStatus {
            table: spec.table.clone(),
            rows: table.len() as u64,
            latest_point,
        })
    }
}
