//! Skip accounting and document headers

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Why a series, period or point was left out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Series without the required production type
    MissingProductionType,
    /// Series carrying only a consumption-side zone
    ConsumptionSeries,
    /// Series whose periods were all unusable, or that had none
    NoUsablePeriod,
    /// Period start missing or unparseable
    InvalidPeriodStart,
    /// Period resolution missing or not a whole number of minutes
    InvalidResolution,
    /// Point with neither position nor timestamp
    MissingPosition,
    /// Position not a positive integer
    InvalidPosition,
    /// Point timestamp unparseable or off the resolution grid
    InvalidTimestamp,
    /// Explicit position and timestamp disagree
    PositionMismatch,
    /// Point without a value element
    MissingValue,
    /// Value not a finite decimal
    InvalidValue,
}

impl SkipReason {
    /// Stable snake_case name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingProductionType => "missing_production_type",
            SkipReason::ConsumptionSeries => "consumption_series",
            SkipReason::NoUsablePeriod => "no_usable_period",
            SkipReason::InvalidPeriodStart => "invalid_period_start",
            SkipReason::InvalidResolution => "invalid_resolution",
            SkipReason::MissingPosition => "missing_position",
            SkipReason::InvalidPosition => "invalid_position",
            SkipReason::InvalidTimestamp => "invalid_timestamp",
            SkipReason::PositionMismatch => "position_mismatch",
            SkipReason::MissingValue => "missing_value",
            SkipReason::InvalidValue => "invalid_value",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one or more parsed documents
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseStats {
    /// Documents read
    pub documents: usize,
    /// Series elements encountered
    pub series_seen: usize,
    /// Series dropped entirely
    pub series_skipped: usize,
    /// Periods dropped
    pub periods_skipped: usize,
    /// Points dropped
    pub points_skipped: usize,
    /// Records emitted
    pub records: usize,
    /// Skips by reason
    pub skips: BTreeMap<SkipReason, usize>,
    /// "No data" replies, as `source: reason`
    pub acknowledgements: Vec<String>,
}

impl ParseStats {
    pub(crate) fn record_skip(&mut self, reason: SkipReason) {
        *self.skips.entry(reason).or_insert(0) += 1;
    }

    /// Total skips across all levels
    pub fn total_skipped(&self) -> usize {
        self.skips.values().sum()
    }

    /// Folds another document's counters into this one
    pub fn merge(&mut self, other: &ParseStats) {
        self.documents += other.documents;
        self.series_seen += other.series_seen;
        self.series_skipped += other.series_skipped;
        self.periods_skipped += other.periods_skipped;
        self.points_skipped += other.points_skipped;
        self.records += other.records;
        for (reason, count) in &other.skips {
            *self.skips.entry(*reason).or_insert(0) += count;
        }
        self.acknowledgements
            .extend(other.acknowledgements.iter().cloned());
    }
}

/// Document-level fields read alongside the series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentHeader {
    /// Local name of the root element
    pub root: String,
    /// Document mRID
    pub mrid: Option<String>,
    /// `type`, e.g. `A75`
    pub document_type: Option<String>,
    /// `process.processType`, e.g. `A16`
    pub process_type: Option<String>,
    /// Reason text of an acknowledgement
    pub reason: Option<String>,
    /// Whether the document is a "no matching data" acknowledgement
    pub acknowledgement: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_adds_counters() {
        let mut total = ParseStats::default();
        let mut doc = ParseStats {
            documents: 1,
            series_seen: 3,
            records: 48,
            ..Default::default()
        };
        doc.record_skip(SkipReason::MissingValue);
        doc.record_skip(SkipReason::MissingValue);
        doc.acknowledgements.push("raw_IT.xml: No matching data found".to_string());

        total.merge(&doc);
        total.merge(&doc);

        assert_eq!(total.documents, 2);
        assert_eq!(total.records, 96);
        assert_eq!(total.skips[&SkipReason::MissingValue], 4);
        assert_eq!(total.total_skipped(), 4);
        assert_eq!(total.acknowledgements.len(), 2);
    }

    #[test]
    fn test_skip_reason_serializes_snake_case() {
        let json = serde_json::to_string(&SkipReason::MissingProductionType).unwrap();
        assert_eq!(json, "\"missing_production_type\"");
        assert_eq!(
            SkipReason::PositionMismatch.to_string(),
            "position_mismatch"
        );
    }
}
