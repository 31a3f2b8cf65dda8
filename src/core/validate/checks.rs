//! Structural checks on parsed and enriched partitions
//!
//! These are sanity checks only: they look at the shape of each row and at
//! key uniqueness, never at whether the market values are plausible.

use crate::core::enrich::UNKNOWN;
use crate::core::validate::report::{Check, ValidationReport};
use crate::domain::{EnrichedBatch, EnrichedRow, NaturalKey, Partition, Record};
use std::collections::HashMap;

/// Tracks natural keys and reports repeats against their first row
#[derive(Default)]
struct KeyTracker {
    seen: HashMap<NaturalKey, usize>,
}

impl KeyTracker {
    fn check(&mut self, report: &mut ValidationReport, key: NaturalKey, row: usize) {
        if let Some(first) = self.seen.get(&key) {
            report.fail(
                Check::DuplicateKey,
                row,
                format!(
                    "{} {} {} position {} repeats row {first}",
                    key.country,
                    key.psr_type.as_ref().map(|p| p.as_str()).unwrap_or("-"),
                    key.start_time.to_rfc3339(),
                    key.position
                ),
            );
        } else {
            self.seen.insert(key, row);
        }
    }
}

fn check_value(report: &mut ValidationReport, row: usize, value: f64, is_generation: bool) {
    if !value.is_finite() {
        report.fail(Check::NonFiniteValue, row, format!("value {value}"));
    } else if is_generation && value < 0.0 {
        report.fail(Check::NegativeQuantity, row, format!("quantity {value} MW"));
    }
}

fn check_position(report: &mut ValidationReport, row: usize, position: u32) {
    if position < 1 {
        report.fail(Check::InvalidPosition, row, format!("position {position}"));
    }
}

/// Validates the parsed records of a partition
pub fn validate_parsed(partition: &Partition, records: &[Record]) -> ValidationReport {
    let mut report = ValidationReport::new(partition, "parsed");
    let mut keys = KeyTracker::default();
    let needs_psr = partition.category.has_production_type();
    report.rows = records.len();

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;

        if record.category != partition.category {
            report.fail(
                Check::CategoryMismatch,
                row,
                format!("{} row in {} partition", record.category, partition.category),
            );
        }

        match &record.psr_type {
            Some(psr) => {
                *report
                    .psr_distribution
                    .entry(psr.as_str().to_string())
                    .or_insert(0) += 1;
            }
            None if needs_psr => report.fail(Check::RequiredField, row, "psr_type missing"),
            None => {}
        }

        if record.bidding_zone.is_none() {
            report.gap("bidding_zone");
        }

        check_position(&mut report, row, record.position);
        check_value(&mut report, row, record.value, needs_psr);

        keys.check(
            &mut report,
            NaturalKey {
                country: record.country.clone(),
                psr_type: if needs_psr { record.psr_type.clone() } else { None },
                start_time: record.start_time,
                position: record.position,
            },
            row,
        );
    }

    report
}

fn check_label(report: &mut ValidationReport, row: usize, field: &str, value: &str) {
    if value.trim().is_empty() {
        report.fail(Check::RequiredField, row, format!("{field} empty"));
    } else if value == UNKNOWN {
        report.gap(field);
    }
}

/// Validates the enriched rows of a partition
pub fn validate_enriched(partition: &Partition, batch: &EnrichedBatch) -> ValidationReport {
    let mut report = ValidationReport::new(partition, "enriched");
    let mut keys = KeyTracker::default();
    report.rows = batch.len();

    if batch.category() != partition.category {
        report.fail(
            Check::CategoryMismatch,
            0,
            format!("{} rows in {} partition", batch.category(), partition.category),
        );
    }

    match batch {
        EnrichedBatch::Generation(rows) => {
            for (idx, r) in rows.iter().enumerate() {
                let row = idx + 1;
                check_label(&mut report, row, "country_name", &r.country_name);
                check_label(&mut report, row, "generation_type", &r.generation_type);
                if r.bidding_zone.is_none() {
                    report.gap("bidding_zone");
                }
                *report
                    .psr_distribution
                    .entry(r.psr_type.as_str().to_string())
                    .or_insert(0) += 1;
                check_position(&mut report, row, r.position);
                check_value(&mut report, row, r.value(), true);
                keys.check(&mut report, r.natural_key(), row);
            }
        }
        EnrichedBatch::Prices(rows) => {
            for (idx, r) in rows.iter().enumerate() {
                let row = idx + 1;
                check_label(&mut report, row, "country_name", &r.country_name);
                if r.bidding_zone.is_none() {
                    report.gap("bidding_zone");
                }
                check_position(&mut report, row, r.position);
                check_value(&mut report, row, r.value(), false);
                keys.check(&mut report, r.natural_key(), row);
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validate::report::Check;
    use crate::domain::{Category, CountryCode, GenerationRow, PriceRow, PsrType, Resolution};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn partition(category: Category) -> Partition {
        Partition::new(category, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap())
    }

    fn record(psr: Option<&str>, position: u32, value: f64) -> Record {
        Record {
            country: CountryCode::new("FR").unwrap(),
            bidding_zone: None,
            category: Category::Generation,
            psr_type: psr.map(|p| PsrType::new(p).unwrap()),
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position,
            value,
        }
    }

    #[test]
    fn test_clean_parsed_partition() {
        let records = vec![
            record(Some("B16"), 1, 10.0),
            record(Some("B16"), 2, 11.0),
            record(Some("B19"), 1, 0.0),
        ];
        let report = validate_parsed(&partition(Category::Generation), &records);
        assert!(report.is_valid(), "{}", report.format_summary());
        assert_eq!(report.rows, 3);
        assert_eq!(report.psr_distribution["B16"], 2);
        assert_eq!(report.gaps["bidding_zone"], 3);
    }

    #[test]
    fn test_parsed_structural_failures() {
        let records = vec![
            record(None, 1, 10.0),
            record(Some("B16"), 0, 10.0),
            record(Some("B16"), 2, -5.0),
            record(Some("B16"), 2, 6.0),
            record(Some("B16"), 3, f64::NAN),
        ];
        let report = validate_parsed(&partition(Category::Generation), &records);
        assert!(!report.is_valid());
        assert_eq!(report.failures[&Check::RequiredField], 1);
        assert_eq!(report.failures[&Check::InvalidPosition], 1);
        assert_eq!(report.failures[&Check::NegativeQuantity], 1);
        assert_eq!(report.failures[&Check::DuplicateKey], 1);
        assert_eq!(report.failures[&Check::NonFiniteValue], 1);
        let dup = report
            .issues
            .iter()
            .find(|i| i.check == Check::DuplicateKey)
            .unwrap();
        assert_eq!(dup.row, 4);
        assert!(dup.message.contains("repeats row 3"));
    }

    #[test]
    fn test_negative_prices_allowed() {
        let mut r = record(None, 1, -12.5);
        r.category = Category::Prices;
        let report = validate_parsed(&partition(Category::Prices), &[r]);
        assert!(report.is_valid());
    }

    #[test]
    fn test_category_mismatch() {
        let report = validate_parsed(
            &partition(Category::Prices),
            &[record(Some("B16"), 1, 1.0)],
        );
        assert_eq!(report.failures[&Check::CategoryMismatch], 1);
    }

    #[test]
    fn test_enriched_gaps_and_required() {
        let base = GenerationRow {
            country: CountryCode::new("FR").unwrap(),
            country_name: "France".to_string(),
            bidding_zone: None,
            psr_type: PsrType::new("B16").unwrap(),
            generation_type: UNKNOWN.to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position: 1,
            quantity_mw: 3.0,
        };
        let mut empty_name = base.clone();
        empty_name.position = 2;
        empty_name.country_name = String::new();

        let report = validate_enriched(
            &partition(Category::Generation),
            &EnrichedBatch::Generation(vec![base, empty_name]),
        );
        assert_eq!(report.gaps["generation_type"], 2);
        assert_eq!(report.failures[&Check::RequiredField], 1);
    }

    #[test]
    fn test_enriched_prices_duplicates() {
        let row = PriceRow {
            country: CountryCode::new("ES").unwrap(),
            country_name: "Spain".to_string(),
            bidding_zone: None,
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position: 1,
            price_eur: 40.0,
        };
        let report = validate_enriched(
            &partition(Category::Prices),
            &EnrichedBatch::Prices(vec![row.clone(), row]),
        );
        assert_eq!(report.failures[&Check::DuplicateKey], 1);
        assert!(report.psr_distribution.is_empty());
    }
}
