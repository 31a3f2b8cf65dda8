//! CLI command implementations
//!
//! Stage commands share [`PartitionArgs`] and report through
//! [`report_partitions`], which prints summaries (or JSON) and maps the
//! first failure to its exit code.

pub mod enrich;
pub mod init;
pub mod load;
pub mod parse;
pub mod run;
pub mod status;
pub mod validate;
pub mod validate_config;

use crate::config::{load_config, EtlConfig};
use crate::core::pipeline::StageSummary;
use crate::domain::time::parse_target_date;
use crate::domain::{resolve_target_date, Category, EtlError, Partition, Result};
use chrono::{NaiveDate, Utc};
use clap::Args;
use serde_json::json;
use uuid::Uuid;

/// Partition selection shared by the stage commands
#[derive(Args, Debug, Clone, Default)]
pub struct PartitionArgs {
    /// Target date (YYYY-MM-DD), defaults to yesterday in UTC
    #[arg(long, value_parser = parse_target_date)]
    pub date: Option<NaiveDate>,

    /// Category to process (generation or prices), defaults to all configured
    #[arg(long)]
    pub category: Option<Category>,

    /// Print summaries as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl PartitionArgs {
    /// Date this invocation processes
    pub fn target_date(&self) -> NaiveDate {
        resolve_target_date(self.date, Utc::now())
    }

    /// Categories this invocation processes
    pub fn categories(&self, config: &EtlConfig) -> Vec<Category> {
        match self.category {
            Some(category) => vec![category],
            None => config.pipeline.categories.clone(),
        }
    }

    /// One partition per selected category, all on `date`
    pub fn partitions(&self, config: &EtlConfig, date: NaiveDate) -> Vec<Partition> {
        self.categories(config)
            .into_iter()
            .map(|category| Partition::new(category, date))
            .collect()
    }
}

/// Loads configuration, printing the failure and returning exit code 2
pub(crate) fn load_config_or_exit(config_path: &str) -> std::result::Result<EtlConfig, i32> {
    load_config(config_path).map_err(|e| {
        tracing::error!(error = %e, config_path, "Failed to load configuration");
        eprintln!("❌ Failed to load configuration: {e}");
        e.exit_code()
    })
}

/// Prints a fatal error and returns its exit code
pub(crate) fn fail(error: &EtlError) -> i32 {
    crate::log_error_with_context!(error, "Command failed");
    eprintln!("❌ {error}");
    error.exit_code()
}

/// Prints the outcome of every partition and returns the process exit code
///
/// Exit code is 0 when every partition succeeded, otherwise the code of the
/// first failure in category order.
pub(crate) fn report_partitions(
    run_id: Uuid,
    outcomes: &[(Partition, Result<Vec<StageSummary>>)],
    json_output: bool,
) -> i32 {
    let mut exit_code = 0;

    for (partition, outcome) in outcomes {
        match outcome {
            Ok(summaries) => summaries.iter().for_each(StageSummary::log_summary),
            Err(e) => {
                tracing::error!(partition = %partition, error = %e, "Partition failed");
                if exit_code == 0 {
                    exit_code = e.exit_code();
                }
            }
        }
    }

    if json_output {
        let partitions: Vec<_> = outcomes
            .iter()
            .map(|(partition, outcome)| match outcome {
                Ok(summaries) => json!({
                    "partition": partition.to_string(),
                    "status": "ok",
                    "stages": summaries,
                }),
                Err(e) => json!({
                    "partition": partition.to_string(),
                    "status": "failed",
                    "error": e.to_string(),
                    "exit_code": e.exit_code(),
                }),
            })
            .collect();
        let document = json!({
            "run_id": run_id,
            "exit_code": exit_code,
            "partitions": partitions,
        });
        match serde_json::to_string_pretty(&document) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("❌ Failed to serialize summary: {e}");
                return 5;
            }
        }
    } else {
        for (partition, outcome) in outcomes {
            match outcome {
                Ok(summaries) => {
                    for summary in summaries {
                        print!("✅ {}", summary.format_summary());
                    }
                }
                Err(e) => println!("❌ {partition}: {e}"),
            }
        }
    }

    exit_code
}
