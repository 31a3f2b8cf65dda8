//! `run` command: parse, enrich and load every selected category
//!
//! Categories run concurrently; stages within a category run in order.

use crate::adapters::database::create_record_store;
use crate::adapters::files::PartitionLayout;
use crate::cli::commands::{fail, load_config_or_exit, report_partitions, PartitionArgs};
use crate::core::load::{Loader, LoaderSettings};
use crate::core::pipeline::{run_categories, RunContext};
use crate::core::reference::ReferenceResolver;
use clap::Args;
use std::sync::Arc;
use std::time::Instant;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub partition: PartitionArgs,

    /// Parse and enrich, but only report what the load would write
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config_or_exit(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        let resolver = match ReferenceResolver::from_csv_files(
            &config.reference.countries_path,
            &config.reference.production_types_path,
        ) {
            Ok(r) => Arc::new(r),
            Err(e) => return Ok(fail(&e)),
        };

        let store = match create_record_store(&config).await {
            Ok(s) => s,
            Err(e) => return Ok(fail(&e)),
        };
        let loader = Loader::new(store, LoaderSettings::from_config(&config));
        if let Err(e) = loader.prepare().await {
            return Ok(fail(&e));
        }

        let ctx = RunContext::new(PartitionLayout::new(&config.storage.data_root));
        let date = self.partition.target_date();
        let categories = self.partition.categories(&config);
        let started = Instant::now();
        tracing::info!(
            run_id = %ctx.run_id,
            date = %date,
            categories = ?categories,
            dry_run = config.application.dry_run,
            "Starting run"
        );

        let outcomes: Vec<_> = run_categories(&ctx, resolver, &loader, &categories, date)
            .await
            .into_iter()
            .map(|run| (run.partition, run.result))
            .collect();

        let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
        tracing::info!(
            run_id = %ctx.run_id,
            partitions = outcomes.len(),
            failed,
            duration_ms = started.elapsed().as_millis() as u64,
            "Run finished"
        );

        Ok(report_partitions(ctx.run_id, &outcomes, self.partition.json))
    }
}
