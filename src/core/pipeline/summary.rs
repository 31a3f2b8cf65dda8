//! Per-stage summaries

use crate::core::enrich::UnresolvedCounts;
use crate::core::load::UpsertOutcome;
use crate::core::parse::ParseStats;
use crate::core::validate::ValidationReport;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Enrich,
    Load,
    Validate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Enrich => "enrich",
            Stage::Load => "load",
            Stage::Validate => "validate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recovered conditions and counters specific to a stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageDetail {
    Parse(ParseStats),
    Enrich(UnresolvedCounts),
    Load(UpsertOutcome),
    Validate(ValidationReport),
}

/// Outcome of one stage over one partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSummary {
    pub run_id: Uuid,
    pub stage: Stage,
    /// Partition identity, e.g. `prices/2026/01/27`
    pub partition: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub duration_ms: u64,
    pub detail: StageDetail,
}

impl StageSummary {
    pub fn new(
        run_id: Uuid,
        stage: Stage,
        partition: impl ToString,
        rows_in: usize,
        rows_out: usize,
        duration: Duration,
        detail: StageDetail,
    ) -> Self {
        Self {
            run_id,
            stage,
            partition: partition.to_string(),
            rows_in,
            rows_out,
            duration_ms: duration.as_millis() as u64,
            detail,
        }
    }

    /// Human-readable summary
    pub fn format_summary(&self) -> String {
        let mut out = format!(
            "{} {}: {} in, {} out ({} ms)\n",
            self.stage, self.partition, self.rows_in, self.rows_out, self.duration_ms
        );
        match &self.detail {
            StageDetail::Parse(stats) => {
                out.push_str(&format!(
                    "  documents: {}, series: {}, skipped series/periods/points: {}/{}/{}\n",
                    stats.documents,
                    stats.series_seen,
                    stats.series_skipped,
                    stats.periods_skipped,
                    stats.points_skipped
                ));
                for (reason, count) in &stats.skips {
                    out.push_str(&format!("  skip {}: {count}\n", reason.as_str()));
                }
                for ack in &stats.acknowledgements {
                    out.push_str(&format!("  acknowledgement: {ack}\n"));
                }
            }
            StageDetail::Enrich(unresolved) => {
                out.push_str(&format!(
                    "  unresolved country_name: {}, bidding_zone: {}, generation_type: {}, defaulted zones: {}\n",
                    unresolved.country_name,
                    unresolved.bidding_zone,
                    unresolved.generation_type,
                    unresolved.defaulted_zone
                ));
            }
            StageDetail::Load(outcome) => {
                if outcome.dry_run {
                    out.push_str("  DRY RUN: nothing written\n");
                }
                out.push_str(&format!(
                    "  inserted: {}, updated: {}, unchanged: {}, duplicates collapsed: {}, batches: {}\n",
                    outcome.inserted,
                    outcome.updated,
                    outcome.unchanged,
                    outcome.duplicates_collapsed,
                    outcome.batches
                ));
            }
            StageDetail::Validate(report) => out.push_str(&report.format_summary()),
        }
        out
    }

    /// Logs the summary, with recovered conditions at warn
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            stage = self.stage.as_str(),
            partition = %self.partition,
            rows_in = self.rows_in,
            rows_out = self.rows_out,
            duration_ms = self.duration_ms,
            "Stage summary"
        );

        match &self.detail {
            StageDetail::Parse(stats) => {
                if stats.total_skipped() > 0 {
                    tracing::warn!(
                        partition = %self.partition,
                        skipped = stats.total_skipped(),
                        series_skipped = stats.series_skipped,
                        periods_skipped = stats.periods_skipped,
                        points_skipped = stats.points_skipped,
                        "Malformed elements skipped"
                    );
                }
                if !stats.acknowledgements.is_empty() {
                    tracing::warn!(
                        partition = %self.partition,
                        acknowledgements = stats.acknowledgements.len(),
                        "Acknowledgement documents carried no data"
                    );
                }
            }
            StageDetail::Enrich(unresolved) => {
                if unresolved.total() > 0 {
                    tracing::warn!(
                        partition = %self.partition,
                        country_name = unresolved.country_name,
                        bidding_zone = unresolved.bidding_zone,
                        generation_type = unresolved.generation_type,
                        "Rows with unresolved reference fields"
                    );
                }
            }
            StageDetail::Load(outcome) => {
                tracing::info!(
                    partition = %self.partition,
                    inserted = outcome.inserted,
                    updated = outcome.updated,
                    unchanged = outcome.unchanged,
                    duplicates_collapsed = outcome.duplicates_collapsed,
                    dry_run = outcome.dry_run,
                    "Load outcome"
                );
            }
            StageDetail::Validate(report) => report.log_summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_shape() {
        let summary = StageSummary::new(
            Uuid::nil(),
            Stage::Load,
            "prices/2026/01/27",
            24,
            24,
            Duration::from_millis(12),
            StageDetail::Load(UpsertOutcome {
                submitted: 24,
                inserted: 24,
                batches: 1,
                ..Default::default()
            }),
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stage"], "load");
        assert_eq!(json["partition"], "prices/2026/01/27");
        assert_eq!(json["detail"]["load"]["inserted"], 24);
        assert_eq!(json["duration_ms"], 12);
    }

    #[test]
    fn test_format_summary_parse() {
        let mut stats = ParseStats {
            documents: 2,
            records: 10,
            ..Default::default()
        };
        stats.acknowledgements.push("raw_IT.xml: No matching data found".to_string());
        let summary = StageSummary::new(
            Uuid::nil(),
            Stage::Parse,
            "generation/2026/01/27",
            2,
            10,
            Duration::ZERO,
            StageDetail::Parse(stats),
        );
        let text = summary.format_summary();
        assert!(text.starts_with("parse generation/2026/01/27: 2 in, 10 out"));
        assert!(text.contains("acknowledgement: raw_IT.xml"));
    }
}
