//! Joins parsed records against the reference tables

use super::fields::joined_tables;
use crate::core::reference::ReferenceResolver;
use crate::domain::{
    BiddingZone, Category, CountryCode, EnrichedBatch, EtlError, GenerationRow, PriceRow, Record,
    Result,
};
use serde::Serialize;
use std::collections::HashMap;

/// Value written when a reference lookup finds nothing
pub const UNKNOWN: &str = "Unknown";

/// Per-field counts of rows the reference tables could not complete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnresolvedCounts {
    /// Rows whose country is not in the country table
    pub country_name: usize,
    /// Rows left without a bidding zone
    pub bidding_zone: usize,
    /// Generation rows whose production type is not in the table
    pub generation_type: usize,
    /// Rows whose zone came from the country default
    pub defaulted_zone: usize,
}

impl UnresolvedCounts {
    /// Sum of per-field unresolved counts
    pub fn total(&self) -> usize {
        self.country_name + self.bidding_zone + self.generation_type
    }
}

/// Output of one enrichment pass
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub rows: EnrichedBatch,
    pub unresolved: UnresolvedCounts,
}

/// Enrichment engine over a shared resolver
pub struct Enricher<'a> {
    resolver: &'a ReferenceResolver,
}

impl<'a> Enricher<'a> {
    pub fn new(resolver: &'a ReferenceResolver) -> Self {
        Self { resolver }
    }

    /// Enriches the records of one category
    ///
    /// Rows are never dropped: unknown codes get [`UNKNOWN`] and are counted.
    /// Output is sorted by `(country, psr_type, start_time, position)`.
    ///
    /// # Errors
    ///
    /// - [`EtlError::JoinAmbiguous`] if a joined table has duplicated keys
    /// - [`EtlError::Validation`] if a record belongs to another category, or a
    ///   generation record has no production type
    pub fn enrich(
        &self,
        category: Category,
        records: impl IntoIterator<Item = Record>,
    ) -> Result<Enrichment> {
        for table in joined_tables(category) {
            self.resolver.ensure_unique(table)?;
        }

        let mut unresolved = UnresolvedCounts::default();
        let mut zones: HashMap<CountryCode, Option<BiddingZone>> = HashMap::new();

        let rows = match category {
            Category::Generation => {
                let mut rows = Vec::new();
                for record in records {
                    check_category(&record, category)?;
                    let psr_type = record.psr_type.clone().ok_or_else(|| {
                        EtlError::Validation(format!(
                            "Generation record for {} at {} position {} has no psr_type",
                            record.country, record.start_time, record.position
                        ))
                    })?;
                    let country_name = self.country_name(&record.country, &mut unresolved);
                    let bidding_zone = self.bidding_zone(&record, &mut zones, &mut unresolved)?;
                    let generation_type = match self.resolver.lookup_production_type(&psr_type) {
                        Some(label) => label.to_string(),
                        None => {
                            unresolved.generation_type += 1;
                            UNKNOWN.to_string()
                        }
                    };

                    rows.push(GenerationRow {
                        country: record.country,
                        country_name,
                        bidding_zone,
                        psr_type,
                        generation_type,
                        start_time: record.start_time,
                        resolution: record.resolution,
                        position: record.position,
                        quantity_mw: record.value,
                    });
                }
                rows.sort_by(|a, b| {
                    (&a.country, &a.psr_type, a.start_time, a.position).cmp(&(
                        &b.country,
                        &b.psr_type,
                        b.start_time,
                        b.position,
                    ))
                });
                EnrichedBatch::Generation(rows)
            }
            Category::Prices => {
                let mut rows = Vec::new();
                for record in records {
                    check_category(&record, category)?;
                    let country_name = self.country_name(&record.country, &mut unresolved);
                    let bidding_zone = self.bidding_zone(&record, &mut zones, &mut unresolved)?;

                    rows.push(PriceRow {
                        country: record.country,
                        country_name,
                        bidding_zone,
                        start_time: record.start_time,
                        resolution: record.resolution,
                        position: record.position,
                        price_eur: record.value,
                    });
                }
                rows.sort_by(|a, b| {
                    (&a.country, a.start_time, a.position).cmp(&(
                        &b.country,
                        b.start_time,
                        b.position,
                    ))
                });
                EnrichedBatch::Prices(rows)
            }
        };

        if unresolved.total() > 0 {
            tracing::warn!(
                category = %category,
                country_name = unresolved.country_name,
                bidding_zone = unresolved.bidding_zone,
                generation_type = unresolved.generation_type,
                "Reference tables did not resolve every row"
            );
        }
        if unresolved.defaulted_zone > 0 {
            tracing::info!(
                category = %category,
                rows = unresolved.defaulted_zone,
                "Filled bidding zone from country default"
            );
        }

        Ok(Enrichment { rows, unresolved })
    }

    fn country_name(&self, code: &CountryCode, unresolved: &mut UnresolvedCounts) -> String {
        match self
            .resolver
            .lookup_country(code)
            .map(|entry| entry.name.trim())
            .filter(|name| !name.is_empty())
        {
            Some(name) => name.to_string(),
            None => {
                unresolved.country_name += 1;
                UNKNOWN.to_string()
            }
        }
    }

    fn bidding_zone(
        &self,
        record: &Record,
        cache: &mut HashMap<CountryCode, Option<BiddingZone>>,
        unresolved: &mut UnresolvedCounts,
    ) -> Result<Option<BiddingZone>> {
        if let Some(ref zone) = record.bidding_zone {
            return Ok(Some(zone.clone()));
        }

        let default = match cache.get(&record.country) {
            Some(zone) => zone.clone(),
            None => {
                let zone = self.resolver.default_zone(&record.country)?;
                cache.insert(record.country.clone(), zone.clone());
                zone
            }
        };

        match default {
            Some(zone) => {
                unresolved.defaulted_zone += 1;
                Ok(Some(zone))
            }
            None => {
                unresolved.bidding_zone += 1;
                Ok(None)
            }
        }
    }
}

fn check_category(record: &Record, category: Category) -> Result<()> {
    if record.category != category {
        return Err(EtlError::Validation(format!(
            "Record of category {} found while enriching {}",
            record.category, category
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::{CountryEntry, ProductionTypeEntry};
    use crate::domain::{PsrType, Resolution};
    use chrono::{TimeZone, Utc};

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::new(
            vec![
                CountryEntry {
                    code: CountryCode::new("FR").unwrap(),
                    name: "France".to_string(),
                    default_bidding_zone: Some(BiddingZone::new("10YFR-RTE------C").unwrap()),
                },
                CountryEntry {
                    code: CountryCode::new("DE").unwrap(),
                    name: "Germany".to_string(),
                    default_bidding_zone: Some(BiddingZone::new("10Y1001A1001A83F").unwrap()),
                },
            ],
            vec![ProductionTypeEntry {
                code: PsrType::new("B16").unwrap(),
                label: "Solar".to_string(),
            }],
        )
    }

    fn record(country: &str, psr: Option<&str>, position: u32, category: Category) -> Record {
        Record {
            country: CountryCode::new(country).unwrap(),
            bidding_zone: None,
            category,
            psr_type: psr.map(|p| PsrType::new(p).unwrap()),
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position,
            value: 10.0 * position as f64,
        }
    }

    #[test]
    fn test_generation_join_and_default_zone() {
        let resolver = resolver();
        let enrichment = Enricher::new(&resolver)
            .enrich(
                Category::Generation,
                vec![
                    record("FR", Some("B16"), 2, Category::Generation),
                    record("FR", Some("B16"), 1, Category::Generation),
                ],
            )
            .unwrap();

        let rows = match enrichment.rows {
            EnrichedBatch::Generation(rows) => rows,
            other => panic!("unexpected batch {other:?}"),
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 1);
        assert_eq!(rows[0].country_name, "France");
        assert_eq!(rows[0].generation_type, "Solar");
        assert_eq!(rows[0].bidding_zone.as_ref().unwrap().as_str(), "10YFR-RTE------C");
        assert_eq!(rows[1].quantity_mw, 20.0);
        assert_eq!(enrichment.unresolved.defaulted_zone, 2);
        assert_eq!(enrichment.unresolved.total(), 0);
    }

    #[test]
    fn test_unknown_codes_are_kept_with_sentinel() {
        let resolver = resolver();
        let enrichment = Enricher::new(&resolver)
            .enrich(
                Category::Generation,
                vec![record("PL", Some("B99"), 1, Category::Generation)],
            )
            .unwrap();

        match enrichment.rows {
            EnrichedBatch::Generation(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].country_name, UNKNOWN);
                assert_eq!(rows[0].generation_type, UNKNOWN);
                assert!(rows[0].bidding_zone.is_none());
            }
            other => panic!("unexpected batch {other:?}"),
        }
        assert_eq!(enrichment.unresolved.country_name, 1);
        assert_eq!(enrichment.unresolved.generation_type, 1);
        assert_eq!(enrichment.unresolved.bidding_zone, 1);
        // one row, three unresolved fields
        assert_eq!(enrichment.unresolved.total(), 3);
    }

    #[test]
    fn test_explicit_zone_is_kept() {
        let resolver = resolver();
        let mut rec = record("FR", None, 1, Category::Prices);
        rec.bidding_zone = Some(BiddingZone::new("10YDOM-1001A082L").unwrap());
        let enrichment = Enricher::new(&resolver)
            .enrich(Category::Prices, vec![rec])
            .unwrap();
        match enrichment.rows {
            EnrichedBatch::Prices(rows) => {
                assert_eq!(rows[0].bidding_zone.as_ref().unwrap().as_str(), "10YDOM-1001A082L");
                assert_eq!(rows[0].price_eur, 10.0);
            }
            other => panic!("unexpected batch {other:?}"),
        }
        assert_eq!(enrichment.unresolved.defaulted_zone, 0);
    }

    #[test]
    fn test_duplicated_country_code_is_ambiguous() {
        let mut countries = vec![CountryEntry {
            code: CountryCode::new("FR").unwrap(),
            name: "France".to_string(),
            default_bidding_zone: None,
        }];
        countries.push(countries[0].clone());
        let resolver = ReferenceResolver::new(countries, Vec::new());

        let result = Enricher::new(&resolver).enrich(
            Category::Prices,
            vec![record("FR", None, 1, Category::Prices)],
        );
        assert!(matches!(result, Err(EtlError::JoinAmbiguous { .. })));
    }

    #[test]
    fn test_prices_ignore_production_type_duplicates() {
        let mut types = vec![ProductionTypeEntry {
            code: PsrType::new("B16").unwrap(),
            label: "Solar".to_string(),
        }];
        types.push(types[0].clone());
        let resolver = ReferenceResolver::new(
            vec![CountryEntry {
                code: CountryCode::new("FR").unwrap(),
                name: "France".to_string(),
                default_bidding_zone: None,
            }],
            types,
        );

        let enricher = Enricher::new(&resolver);
        assert!(enricher
            .enrich(Category::Prices, vec![record("FR", None, 1, Category::Prices)])
            .is_ok());
        assert!(enricher
            .enrich(
                Category::Generation,
                vec![record("FR", Some("B16"), 1, Category::Generation)]
            )
            .is_err());
    }

    #[test]
    fn test_category_mismatch_is_validation_error() {
        let resolver = resolver();
        let result = Enricher::new(&resolver).enrich(
            Category::Prices,
            vec![record("FR", Some("B16"), 1, Category::Generation)],
        );
        assert!(matches!(result, Err(EtlError::Validation(_))));
    }

    #[test]
    fn test_generation_without_production_type_is_rejected() {
        let resolver = resolver();
        let result = Enricher::new(&resolver).enrich(
            Category::Generation,
            vec![record("FR", None, 1, Category::Generation)],
        );
        assert!(matches!(result, Err(EtlError::Validation(_))));
    }
}
