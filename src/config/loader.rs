//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{EtlConfig, StoreTarget};
use super::secret::secret_string;
use crate::domain::errors::EtlError;
use crate::domain::result::Result;
use crate::domain::Category;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Prefix of every override variable
pub const ENV_PREFIX: &str = "ENTSOE_ETL_";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`EtlConfig`]
/// 4. Applies environment variable overrides (`ENTSOE_ETL_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`EtlError::Configuration`] if the file is missing or unreadable,
/// a referenced variable is unset, the TOML is malformed, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use entsoe_etl::config::loader::load_config;
///
/// let config = load_config("entsoe-etl.toml").expect("Failed to load config");
/// println!("{}", config.storage.data_root.display());
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<EtlConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(EtlError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        EtlError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`], from TOML text already in memory
pub fn load_config_from_str(contents: &str) -> Result<EtlConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: EtlConfig = toml::from_str(&contents)
        .map_err(|e| EtlError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config
        .validate()
        .map_err(|e| EtlError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched so documented placeholders do not
/// have to be set.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| EtlError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(EtlError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}")).ok()
}

fn parse_env<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        EtlError::Configuration(format!("Invalid value for {ENV_PREFIX}{key} '{raw}': {e}"))
    })
}

/// Applies environment variable overrides using the `ENTSOE_ETL_` prefix
///
/// Variables follow the pattern `ENTSOE_ETL_<SECTION>_<KEY>`, for example
/// `ENTSOE_ETL_LOADER_BATCH_SIZE` or `ENTSOE_ETL_POSTGRESQL_CONNECTION_STRING`.
/// An unparseable value is a configuration error rather than silently ignored.
fn apply_env_overrides(config: &mut EtlConfig) -> Result<()> {
    // Application
    if let Some(val) = env_var("APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = env_var("APPLICATION_DRY_RUN") {
        config.application.dry_run = parse_env("APPLICATION_DRY_RUN", &val)?;
    }
    if let Some(val) = env_var("ENVIRONMENT") {
        config.environment = match val.trim().to_lowercase().as_str() {
            "development" => super::schema::Environment::Development,
            "staging" => super::schema::Environment::Staging,
            "production" => super::schema::Environment::Production,
            other => {
                return Err(EtlError::Configuration(format!(
                    "Invalid value for {ENV_PREFIX}ENVIRONMENT: {other}"
                )))
            }
        };
    }
    if let Some(val) = env_var("STORE_TARGET") {
        config.store_target = match val.trim().to_lowercase().as_str() {
            "postgresql" => StoreTarget::PostgreSQL,
            "memory" => StoreTarget::Memory,
            other => {
                return Err(EtlError::Configuration(format!(
                    "Invalid value for {ENV_PREFIX}STORE_TARGET: {other}"
                )))
            }
        };
    }

    // Storage and reference tables
    if let Some(val) = env_var("STORAGE_DATA_ROOT") {
        config.storage.data_root = PathBuf::from(val);
    }
    if let Some(val) = env_var("REFERENCE_COUNTRIES_PATH") {
        config.reference.countries_path = PathBuf::from(val);
    }
    if let Some(val) = env_var("REFERENCE_PRODUCTION_TYPES_PATH") {
        config.reference.production_types_path = PathBuf::from(val);
    }

    // Pipeline
    if let Some(val) = env_var("PIPELINE_CATEGORIES") {
        config.pipeline.categories = val
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Category::from_str)
            .collect::<Result<Vec<_>>>()?;
    }

    // Loader
    if let Some(val) = env_var("LOADER_BATCH_SIZE") {
        config.loader.batch_size = parse_env("LOADER_BATCH_SIZE", &val)?;
    }
    if let Some(val) = env_var("LOADER_CONFLICT_POLICY") {
        config.loader.conflict_policy = parse_env("LOADER_CONFLICT_POLICY", &val)?;
    }
    if let Some(val) = env_var("LOADER_GENERATION_TABLE") {
        config.loader.generation_table = val;
    }
    if let Some(val) = env_var("LOADER_PRICES_TABLE") {
        config.loader.prices_table = val;
    }

    // PostgreSQL: a connection string alone is enough to create the section
    if let Some(val) = env_var("POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                let section = format!("connection_string = {}", toml_string(&val));
                config.postgresql = Some(toml::from_str(&section)?);
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = env_var("POSTGRESQL_MAX_CONNECTIONS") {
            pg.max_connections = parse_env("POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Some(val) = env_var("POSTGRESQL_CONNECTION_TIMEOUT_SECONDS") {
            pg.connection_timeout_seconds =
                parse_env("POSTGRESQL_CONNECTION_TIMEOUT_SECONDS", &val)?;
        }
        if let Some(val) = env_var("POSTGRESQL_STATEMENT_TIMEOUT_SECONDS") {
            pg.statement_timeout_seconds =
                parse_env("POSTGRESQL_STATEMENT_TIMEOUT_SECONDS", &val)?;
        }
        if let Some(val) = env_var("POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Logging
    if let Some(val) = env_var("LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env_var("LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
