//! `validate` command: structural checks on a partition artifact

use crate::adapters::files::PartitionLayout;
use crate::cli::commands::{load_config_or_exit, report_partitions, PartitionArgs};
use crate::core::pipeline::{run_validate, RunContext, StageDetail, ValidateTarget};
use crate::domain::EtlError;
use clap::{Args, ValueEnum};

/// Artifact to check
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Artifact {
    Parsed,
    #[default]
    Enriched,
}

impl From<Artifact> for ValidateTarget {
    fn from(artifact: Artifact) -> Self {
        match artifact {
            Artifact::Parsed => ValidateTarget::Parsed,
            Artifact::Enriched => ValidateTarget::Enriched,
        }
    }
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub partition: PartitionArgs,

    /// Which artifact of the partition to check
    #[arg(long, value_enum, default_value_t = Artifact::Enriched)]
    pub artifact: Artifact,
}

impl ValidateArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config_or_exit(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let ctx = RunContext::new(PartitionLayout::new(&config.storage.data_root));
        let target = ValidateTarget::from(self.artifact);
        let date = self.partition.target_date();

        let outcomes: Vec<_> = self
            .partition
            .partitions(&config, date)
            .into_iter()
            .map(|partition| {
                let outcome = run_validate(&ctx, &partition, target).and_then(|summary| {
                    match &summary.detail {
                        StageDetail::Validate(report) if !report.is_valid() => {
                            if !self.partition.json {
                                print!("{}", report.format_summary());
                            }
                            Err(EtlError::Validation(format!(
                                "{} structural check(s) failed",
                                report.failure_count()
                            ))
                            .in_stage("validate", partition))
                        }
                        _ => Ok(vec![summary]),
                    }
                });
                (partition, outcome)
            })
            .collect();

        Ok(report_partitions(ctx.run_id, &outcomes, self.partition.json))
    }
}
