//! Validate config command implementation
//!
//! Loads the configuration (including environment overrides) and prints a
//! summary with credentials redacted.

use crate::config::{load_config, StoreTarget};
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateConfigArgs {
    /// Also print the effective configuration as TOML (secrets redacted)
    #[arg(long)]
    pub dump: bool,
}

impl ValidateConfigArgs {
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(e.exit_code());
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Dry Run: {}", config.application.dry_run);
        println!("  Data Root: {}", config.storage.data_root.display());
        println!(
            "  Reference Tables: {}, {}",
            config.reference.countries_path.display(),
            config.reference.production_types_path.display()
        );
        println!(
            "  Categories: {}",
            config
                .pipeline
                .categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!(
            "  Loader: batch_size={}, conflict_policy={}",
            config.loader.batch_size, config.loader.conflict_policy
        );
        println!(
            "  Tables: {}, {}",
            config.loader.generation_table, config.loader.prices_table
        );

        match config.store_target {
            StoreTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Store Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        pg_config.connection_string.expose_secret().redacted_url()
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                    println!("  SSL Mode: {}", pg_config.ssl_mode);
                }
            }
            StoreTarget::Memory => println!("  Store Target: memory"),
        }

        if self.dump {
            println!();
            println!("{}", toml::to_string_pretty(&config)?);
        }
        println!();
        Ok(0)
    }
}
