//! Domain error types
//!
//! This module defines the error hierarchy for the pipeline. Variants follow the
//! failure taxonomy of the stages: fatal conditions are errors, recovered
//! conditions (skipped points, join misses, upsert conflicts) never reach this type.

use thiserror::Error;

/// Main pipeline error type
#[derive(Debug, Error)]
pub enum EtlError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required input partition, artifact or reference table is absent
    #[error("Source missing: {0}")]
    SourceMissing(String),

    /// Document-level parse failure (broken XML, unreadable CSV row)
    #[error("Parse error: {0}")]
    Parse(String),

    /// A reference table violates its many-to-one contract
    #[error("Ambiguous join against {table}: duplicated keys [{}]", keys.join(", "))]
    JoinAmbiguous {
        /// Reference table name
        table: String,
        /// Offending keys
        keys: Vec<String>,
    },

    /// A stage produced no rows for a category that must have data
    #[error("Stage produced no rows for {0}")]
    EmptyOutput(String),

    /// Structural validation failures
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network/connection errors against the store
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database statement errors
    #[error("Database error: {0}")]
    Database(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A fatal error tagged with the partition and stage it aborted
    #[error("{stage} stage failed for partition {partition}: {source}")]
    Stage {
        /// Stage name (parse, enrich, load, validate)
        stage: String,
        /// Partition identity, e.g. `generation/2026/01/27`
        partition: String,
        /// Underlying error
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// Wraps this error with the identity of the failing stage and partition
    pub fn in_stage(self, stage: impl Into<String>, partition: impl ToString) -> Self {
        match self {
            already @ EtlError::Stage { .. } => already,
            other => EtlError::Stage {
                stage: stage.into(),
                partition: partition.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost error, looking through stage wrappers
    pub fn root(&self) -> &EtlError {
        match self {
            EtlError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Process exit code for this error
    ///
    /// 2 configuration, 3 source missing, 4 connection/database, 5 any other fatal error.
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            EtlError::Configuration(_) => 2,
            EtlError::SourceMissing(_) => 3,
            EtlError::Connection(_) | EtlError::Database(_) => 4,
            _ => 5,
        }
    }
}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for EtlError {
    fn from(err: serde_json::Error) -> Self {
        EtlError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for EtlError {
    fn from(err: toml::de::Error) -> Self {
        EtlError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::Serialization(format!("CSV error: {err}"))
    }
}

impl From<quick_xml::Error> for EtlError {
    fn from(err: quick_xml::Error) -> Self {
        EtlError::Parse(format!("XML error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EtlError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_join_ambiguous_display_lists_keys() {
        let err = EtlError::JoinAmbiguous {
            table: "country".to_string(),
            keys: vec!["FR".to_string(), "DE".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous join against country: duplicated keys [FR, DE]"
        );
    }

    #[test]
    fn test_in_stage_names_partition_and_stage() {
        let err = EtlError::SourceMissing("raw documents".to_string())
            .in_stage("parse", "generation/2026/01/27");
        let message = err.to_string();
        assert!(message.contains("parse stage failed"));
        assert!(message.contains("generation/2026/01/27"));
        assert!(matches!(err.root(), EtlError::SourceMissing(_)));
    }

    #[test]
    fn test_in_stage_does_not_double_wrap() {
        let err = EtlError::Validation("bad".to_string())
            .in_stage("enrich", "prices/2026/01/27")
            .in_stage("load", "prices/2026/01/27");
        match err {
            EtlError::Stage { stage, .. } => assert_eq!(stage, "enrich"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(EtlError::Configuration(String::new()).exit_code(), 2);
        assert_eq!(EtlError::SourceMissing(String::new()).exit_code(), 3);
        assert_eq!(EtlError::Database(String::new()).exit_code(), 4);
        assert_eq!(EtlError::Connection(String::new()).exit_code(), 4);
        assert_eq!(EtlError::EmptyOutput(String::new()).exit_code(), 5);
        assert_eq!(
            EtlError::Connection(String::new())
                .in_stage("load", "x")
                .exit_code(),
            4
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: EtlError = io_err.into();
        assert!(matches!(err, EtlError::Io(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: EtlError = toml_err.into();
        assert!(matches!(err, EtlError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_implements_std_error() {
        let err = EtlError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
