//! Integration tests for logging functionality
//!
//! The global subscriber can only be installed once per process, so a
//! single test owns `init_logging`.

use entsoe_etl::config::LoggingConfig;
use entsoe_etl::core::reference::ReferenceResolver;
use entsoe_etl::logging::{init_logging, parse_log_level};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_level_is_configuration_error() {
    let err = parse_log_level("verbose").unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(parse_log_level("WARN").is_ok());
}

#[test]
fn test_file_layer_writes_json_lines() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };
    assert!(!log_path.exists());

    // The default filter only admits events from the library's own targets
    let guard = init_logging("info", &config).expect("Failed to initialize logging");
    let reference = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/reference");
    ReferenceResolver::from_csv_files(
        reference.join("countries.csv"),
        reference.join("production_types.csv"),
    )
    .unwrap();
    drop(guard);

    let files: Vec<_> = std::fs::read_dir(&log_path)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);

    let contents = std::fs::read_to_string(&files[0]).unwrap();
    let line = contents.lines().last().unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["fields"]["message"], "Reference tables loaded");
    assert_eq!(event["fields"]["countries"], 4);
    assert_eq!(event["fields"]["production_types"], 25);
}
