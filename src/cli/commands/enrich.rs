//! `enrich` command: parsed partition to `enriched_<category>.csv`

use crate::adapters::files::PartitionLayout;
use crate::cli::commands::{fail, load_config_or_exit, report_partitions, PartitionArgs};
use crate::core::pipeline::{run_enrich, RunContext};
use crate::core::reference::ReferenceResolver;
use clap::Args;

/// Arguments for the enrich command
#[derive(Args, Debug)]
pub struct EnrichArgs {
    #[command(flatten)]
    pub partition: PartitionArgs,
}

impl EnrichArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_exit(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let resolver = match ReferenceResolver::from_csv_files(
            &config.reference.countries_path,
            &config.reference.production_types_path,
        ) {
            Ok(r) => r,
            Err(e) => return Ok(fail(&e)),
        };

        let ctx = RunContext::new(PartitionLayout::new(&config.storage.data_root));
        let date = self.partition.target_date();
        tracing::info!(run_id = %ctx.run_id, date = %date, "Starting enrich");

        let outcomes: Vec<_> = self
            .partition
            .partitions(&config, date)
            .into_iter()
            .map(|partition| {
                let outcome = run_enrich(&ctx, &resolver, &partition).map(|summary| vec![summary]);
                (partition, outcome)
            })
            .collect();

        Ok(report_partitions(ctx.run_id, &outcomes, self.partition.json))
    }
}
