//! Idempotent loading of enriched partitions

use crate::adapters::database::RecordStore;
use crate::config::EtlConfig;
use crate::core::load::policy::{ConflictPolicy, TableSpec};
use crate::domain::{Category, EnrichedBatch, Result};
use serde::Serialize;
use std::sync::Arc;

/// Loader options resolved from configuration
#[derive(Debug, Clone)]
pub struct LoaderSettings {
    pub batch_size: usize,
    pub conflict_policy: ConflictPolicy,
    pub dry_run: bool,
    pub generation: TableSpec,
    pub prices: TableSpec,
}

impl LoaderSettings {
    pub fn from_config(config: &EtlConfig) -> Self {
        Self {
            batch_size: config.loader.batch_size,
            conflict_policy: config.loader.conflict_policy,
            dry_run: config.application.dry_run,
            generation: TableSpec::from_config(Category::Generation, &config.loader),
            prices: TableSpec::from_config(Category::Prices, &config.loader),
        }
    }

    /// Destination table of `category`
    pub fn table(&self, category: Category) -> &TableSpec {
        match category {
            Category::Generation => &self.generation,
            Category::Prices => &self.prices,
        }
    }
}

/// What a load did to the destination
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertOutcome {
    /// Rows sent to the store after collapsing duplicates
    pub submitted: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Submitted rows that matched an existing key and changed nothing
    pub unchanged: usize,
    /// Rows dropped because another row in the batch had the same key
    pub duplicates_collapsed: usize,
    pub batches: usize,
    pub dry_run: bool,
}

/// Upserts enriched partitions into a [`RecordStore`]
pub struct Loader {
    store: Arc<dyn RecordStore>,
    settings: LoaderSettings,
}

impl Loader {
    pub fn new(store: Arc<dyn RecordStore>, settings: LoaderSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Creates the destination tables unless running dry
    pub async fn prepare(&self) -> Result<()> {
        if self.settings.dry_run {
            tracing::info!(store = self.store.name(), "DRY RUN: Would ensure destination schema");
            return Ok(());
        }
        self.store
            .ensure_schema(&[self.settings.generation.clone(), self.settings.prices.clone()])
            .await
    }

    /// Loads one partition
    ///
    /// Duplicate natural keys are collapsed per the configured policy before
    /// anything is submitted; the store writes the remainder in one
    /// transaction.
    pub async fn load(&self, batch: EnrichedBatch) -> Result<UpsertOutcome> {
        let policy = self.settings.conflict_policy;
        let batch_size = self.settings.batch_size;
        let spec = self.settings.table(batch.category());

        let (submitted, duplicates_collapsed, counts) = match batch {
            EnrichedBatch::Generation(rows) => {
                let (rows, collapsed) = policy.collapse(rows);
                let counts = if self.settings.dry_run {
                    None
                } else {
                    Some(
                        self.store
                            .upsert_generation(spec, &rows, policy, batch_size)
                            .await?,
                    )
                };
                (rows.len(), collapsed, counts)
            }
            EnrichedBatch::Prices(rows) => {
                let (rows, collapsed) = policy.collapse(rows);
                let counts = if self.settings.dry_run {
                    None
                } else {
                    Some(
                        self.store
                            .upsert_prices(spec, &rows, policy, batch_size)
                            .await?,
                    )
                };
                (rows.len(), collapsed, counts)
            }
        };

        if duplicates_collapsed > 0 {
            tracing::warn!(
                table = %spec.table,
                duplicates_collapsed,
                policy = %policy,
                "Collapsed duplicate natural keys within partition"
            );
        }

        let outcome = match counts {
            None => {
                tracing::info!(
                    table = %spec.table,
                    rows = submitted,
                    "DRY RUN: Would upsert {} rows into {}",
                    submitted,
                    spec.table
                );
                UpsertOutcome {
                    submitted,
                    duplicates_collapsed,
                    batches: submitted.div_ceil(batch_size.max(1)),
                    dry_run: true,
                    ..Default::default()
                }
            }
            Some(counts) => UpsertOutcome {
                submitted,
                inserted: counts.inserted,
                updated: counts.updated,
                unchanged: submitted.saturating_sub(counts.inserted + counts.updated),
                duplicates_collapsed,
                batches: counts.batches,
                dry_run: false,
            },
        };

        tracing::debug!(
            store = self.store.name(),
            table = %spec.table,
            inserted = outcome.inserted,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            "Partition upserted"
        );
        Ok(outcome)
    }
}
