//! Record store factory

use crate::adapters::database::memory::MemoryStore;
use crate::adapters::database::traits::RecordStore;
use crate::adapters::postgresql::{PostgreSQLAdapter, PostgreSQLClient};
use crate::config::{EtlConfig, StoreTarget};
use crate::domain::{EtlError, Result};
use std::sync::Arc;

/// Creates the store selected by `store_target`
///
/// # Errors
///
/// Returns a configuration error when the PostgreSQL section is missing or
/// its connection string is invalid.
pub async fn create_record_store(config: &EtlConfig) -> Result<Arc<dyn RecordStore>> {
    match config.store_target {
        StoreTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                EtlError::Configuration(
                    "store_target is postgresql but [postgresql] is missing".to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL record store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            Ok(Arc::new(PostgreSQLAdapter::new(client)))
        }
        StoreTarget::Memory => {
            tracing::info!("Creating in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
