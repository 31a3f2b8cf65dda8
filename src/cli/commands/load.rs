//! `load` command: enriched partition into the record store

use crate::adapters::database::create_record_store;
use crate::adapters::files::PartitionLayout;
use crate::cli::commands::{fail, load_config_or_exit, report_partitions, PartitionArgs};
use crate::core::load::{Loader, LoaderSettings};
use crate::core::pipeline::{run_load, RunContext};
use clap::Args;

/// Arguments for the load command
#[derive(Args, Debug)]
pub struct LoadArgs {
    #[command(flatten)]
    pub partition: PartitionArgs,

    /// Report what would be written without touching the store
    #[arg(long)]
    pub dry_run: bool,
}

impl LoadArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config_or_exit(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

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
        tracing::info!(
            run_id = %ctx.run_id,
            date = %date,
            dry_run = config.application.dry_run,
            "Starting load"
        );

        let mut outcomes = Vec::new();
        for partition in self.partition.partitions(&config, date) {
            let outcome = run_load(&ctx, &loader, &partition)
                .await
                .map(|summary| vec![summary]);
            outcomes.push((partition, outcome));
        }

        Ok(report_partitions(ctx.run_id, &outcomes, self.partition.json))
    }
}
