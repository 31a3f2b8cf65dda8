//! CLI interface and argument parsing

pub mod commands;

use clap::{Parser, Subcommand};

/// entsoe-etl - ENTSO-E generation and price documents into PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "entsoe-etl")]
#[command(version, about, long_about = None)]
#[command(author = "entsoe-etl Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "entsoe-etl.toml",
        env = "ENTSOE_ETL_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ENTSOE_ETL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse raw documents of a date into flat records
    Parse(commands::parse::ParseArgs),

    /// Join parsed records with the reference tables
    Enrich(commands::enrich::EnrichArgs),

    /// Upsert enriched records into the store
    Load(commands::load::LoadArgs),

    /// Parse, enrich and load every selected category
    Run(commands::run::RunArgs),

    /// Run structural checks on a partition
    Validate(commands::validate::ValidateArgs),

    /// Show partition artifacts and destination tables
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate_config::ValidateConfigArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Commands {
    /// Whether the command reads the configuration file
    pub fn uses_config(&self) -> bool {
        !matches!(self, Commands::Init(_))
    }
}
