//! `parse` command: raw documents to `parsed_<category>.csv`

use crate::adapters::files::PartitionLayout;
use crate::cli::commands::{load_config_or_exit, report_partitions, PartitionArgs};
use crate::core::pipeline::{run_parse, RunContext};
use clap::Args;

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    #[command(flatten)]
    pub partition: PartitionArgs,
}

impl ParseArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_exit(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let ctx = RunContext::new(PartitionLayout::new(&config.storage.data_root));
        let date = self.partition.target_date();
        tracing::info!(run_id = %ctx.run_id, date = %date, "Starting parse");

        let outcomes: Vec<_> = self
            .partition
            .partitions(&config, date)
            .into_iter()
            .map(|partition| {
                let outcome = run_parse(&ctx, &partition).map(|summary| vec![summary]);
                (partition, outcome)
            })
            .collect();

        Ok(report_partitions(ctx.run_id, &outcomes, self.partition.json))
    }
}
