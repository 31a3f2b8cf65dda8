//! Logging and observability
//!
//! This module provides structured logging with:
//! - Human-readable console output
//! - Optional JSON file logging with rotation
//! - `RUST_LOG` filtering
//!
//! # Example
//!
//! ```no_run
//! use entsoe_etl::logging::init_logging;
//! use entsoe_etl::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(partition = "generation/2026/01/27", "Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the start of a stage for a partition
///
/// # Example
///
/// ```no_run
/// use entsoe_etl::log_stage_start;
///
/// log_stage_start!("parse", "generation/2026/01/27");
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($stage:expr, $partition:expr) => {
        tracing::info!(
            stage = $stage,
            partition = %$partition,
            "Starting stage"
        );
    };
}

/// Log the completion of a stage with its output row count
///
/// # Example
///
/// ```no_run
/// use entsoe_etl::log_stage_complete;
/// use std::time::Duration;
///
/// log_stage_complete!("parse", "generation/2026/01/27", 96, Duration::from_millis(40));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($stage:expr, $partition:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            stage = $stage,
            partition = %$partition,
            rows = $rows,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use entsoe_etl::log_error_with_context;
/// use entsoe_etl::domain::EtlError;
///
/// let error = EtlError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log progress through the batches of a load
#[macro_export]
macro_rules! log_batch_processing {
    ($current:expr, $total:expr) => {
        tracing::debug!(
            current = $current,
            total = $total,
            progress_pct = ($current as f64 / $total as f64 * 100.0),
            "Processing batch"
        );
    };
}
