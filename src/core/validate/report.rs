//! Validation report structures

use serde::Serialize;
use std::collections::BTreeMap;

/// Structural check that can fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// A required field is absent or empty
    RequiredField,
    /// Row category differs from the partition category
    CategoryMismatch,
    /// Generation quantity below zero
    NegativeQuantity,
    /// Position below 1
    InvalidPosition,
    /// Value is NaN or infinite
    NonFiniteValue,
    /// Natural key seen more than once
    DuplicateKey,
}

impl Check {
    pub fn as_str(&self) -> &'static str {
        match self {
            Check::RequiredField => "required_field",
            Check::CategoryMismatch => "category_mismatch",
            Check::NegativeQuantity => "negative_quantity",
            Check::InvalidPosition => "invalid_position",
            Check::NonFiniteValue => "non_finite_value",
            Check::DuplicateKey => "duplicate_key",
        }
    }
}

/// One failed check on one row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub check: Check,
    /// 1-based data row, header excluded
    pub row: usize,
    pub message: String,
}

/// Result of validating one partition
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Partition identity, e.g. `generation/2026/01/27`
    pub partition: String,
    /// Artifact that was checked (`parsed` or `enriched`)
    pub artifact: String,
    pub rows: usize,
    /// Failure count per check
    pub failures: BTreeMap<Check, usize>,
    /// First failed checks, in row order
    pub issues: Vec<ValidationIssue>,
    /// Rows lacking each optional field or carrying the unresolved sentinel
    pub gaps: BTreeMap<String, usize>,
    /// Rows per production type (generation only)
    pub psr_distribution: BTreeMap<String, usize>,
}

/// Issues kept in full; later ones are only counted
pub const MAX_REPORTED_ISSUES: usize = 100;

impl ValidationReport {
    pub fn new(partition: impl ToString, artifact: &str) -> Self {
        Self {
            partition: partition.to_string(),
            artifact: artifact.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn fail(&mut self, check: Check, row: usize, message: impl Into<String>) {
        *self.failures.entry(check).or_insert(0) += 1;
        if self.issues.len() < MAX_REPORTED_ISSUES {
            self.issues.push(ValidationIssue {
                check,
                row,
                message: message.into(),
            });
        }
    }

    pub(crate) fn gap(&mut self, field: &str) {
        *self.gaps.entry(field.to_string()).or_insert(0) += 1;
    }

    /// Whether every structural check passed; gaps do not count
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total failed checks
    pub fn failure_count(&self) -> usize {
        self.failures.values().sum()
    }

    /// Human-readable summary
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str(&format!(
            "Validation of {} ({})\n",
            self.partition, self.artifact
        ));
        summary.push_str(&format!("  Rows: {}\n", self.rows));
        summary.push_str(&format!(
            "  Result: {}\n",
            if self.is_valid() { "✅ valid" } else { "❌ invalid" }
        ));

        if !self.gaps.is_empty() {
            summary.push_str("  Gaps:\n");
            for (field, count) in &self.gaps {
                summary.push_str(&format!("    {field}: {count}\n"));
            }
        }

        if !self.psr_distribution.is_empty() {
            summary.push_str("  Production types:\n");
            for (psr, count) in &self.psr_distribution {
                summary.push_str(&format!("    {psr}: {count}\n"));
            }
        }

        if !self.failures.is_empty() {
            summary.push_str(&format!("  Failures: {}\n", self.failure_count()));
            for (check, count) in &self.failures {
                summary.push_str(&format!("    {}: {count}\n", check.as_str()));
            }
        }

        if !self.issues.is_empty() {
            summary.push_str("  Issues:\n");
            for issue in &self.issues {
                summary.push_str(&format!(
                    "    row {}: [{}] {}\n",
                    issue.row,
                    issue.check.as_str(),
                    issue.message
                ));
            }
        }

        summary
    }

    pub fn log_summary(&self) {
        tracing::info!(
            partition = %self.partition,
            artifact = %self.artifact,
            rows = self.rows,
            failures = self.failure_count(),
            gaps = ?self.gaps,
            "Validation complete"
        );
        for (check, &count) in &self.failures {
            tracing::warn!(
                partition = %self.partition,
                check = check.as_str(),
                count,
                "Validation check failed"
            );
        }
    }
}
