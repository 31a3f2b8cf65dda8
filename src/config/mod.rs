//! Configuration management for entsoe-etl.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Configuration files support:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ENTSOE_ETL_<SECTION>_<KEY>` overrides
//! - Default values for every optional setting
//! - Validation of every section on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use entsoe_etl::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("entsoe-etl.toml")?;
//! println!("Data root: {}", config.storage.data_root.display());
//! println!("Batch size: {}", config.loader.batch_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and dry-run switch
//! - [`StorageConfig`] - root of the partition layout
//! - [`ReferenceConfig`] - reference CSV locations
//! - [`PipelineConfig`] - categories processed by default
//! - [`LoaderConfig`] - batch size, conflict policy and table names
//! - [`PostgreSQLConfig`] - connection pool and TLS settings
//! - [`LoggingConfig`] - optional JSON file logging
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! store_target = "postgresql"
//!
//! [storage]
//! data_root = "/srv/entsoe/data"
//!
//! [loader]
//! batch_size = 1000
//! conflict_policy = "update"
//!
//! [postgresql]
//! connection_string = "${DATABASE_URL}"
//! ssl_mode = "require"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, Environment, EtlConfig, LoaderConfig, LoggingConfig, PipelineConfig,
    PostgreSQLConfig, ReferenceConfig, StorageConfig, StoreTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};
