//! Status command implementation
//!
//! Shows destination table counts and which artifacts exist for a date.

use crate::adapters::database::create_record_store;
use crate::adapters::files::PartitionLayout;
use crate::cli::commands::{fail, load_config_or_exit, PartitionArgs};
use crate::core::load::LoaderSettings;
use crate::domain::time::format_instant;
use clap::Args;
use serde_json::json;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub partition: PartitionArgs,
}

impl StatusArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking pipeline status");

        let config = match load_config_or_exit(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let store = match create_record_store(&config).await {
            Ok(s) => s,
            Err(e) => return Ok(fail(&e)),
        };
        if let Err(e) = store.test_connection().await {
            return Ok(fail(&e));
        }

        let settings = LoaderSettings::from_config(&config);
        let layout = PartitionLayout::new(&config.storage.data_root);
        let date = self.partition.target_date();
        let mut entries = Vec::new();

        for partition in self.partition.partitions(&config, date) {
            let spec = settings.table(partition.category);
            let table = match store.table_status(spec).await {
                Ok(status) => json!({
                    "table": status.table,
                    "rows": status.rows,
                    "latest_point": status.latest_point.as_ref().map(format_instant),
                }),
                Err(e) => {
                    tracing::warn!(table = %spec.table, error = %e, "Table status unavailable");
                    json!({ "table": spec.table, "error": e.to_string() })
                }
            };
            let raw_documents = layout
                .raw_documents(&partition)
                .map(|docs| docs.len())
                .unwrap_or(0);

            entries.push(json!({
                "partition": partition.to_string(),
                "raw_documents": raw_documents,
                "parsed": layout.parsed_path(&partition).is_file(),
                "enriched": layout.enriched_path(&partition).is_file(),
                "store": store.name(),
                "destination": table,
            }));
        }

        if self.partition.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(0);
        }

        println!("📊 Pipeline Status ({date})");
        println!();
        for entry in &entries {
            println!("  {}", entry["partition"].as_str().unwrap_or_default());
            println!("    raw documents: {}", entry["raw_documents"]);
            println!("    parsed: {}, enriched: {}", entry["parsed"], entry["enriched"]);
            let destination = &entry["destination"];
            match destination.get("error") {
                Some(error) => println!(
                    "    {}: unavailable ({})",
                    destination["table"].as_str().unwrap_or_default(),
                    error.as_str().unwrap_or_default()
                ),
                None => println!(
                    "    {}: {} rows, latest point {}",
                    destination["table"].as_str().unwrap_or_default(),
                    destination["rows"],
                    destination["latest_point"].as_str().unwrap_or("-")
                ),
            }
        }
        println!();
        Ok(0)
    }
}
