//! Record types flowing between stages
//!
//! [`Record`] is the parser output, one per Point. [`GenerationRow`] and
//! [`PriceRow`] are the enriched, per-category shapes that the loader persists.

use crate::domain::category::Category;
use crate::domain::ids::{BiddingZone, CountryCode, PsrType};
use crate::domain::time::{instant_format, Resolution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat parser output row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Country inferred from the partition addressing
    pub country: CountryCode,

    /// Bidding zone mRID, when the series carries one
    pub bidding_zone: Option<BiddingZone>,

    /// Category of the source document
    pub category: Category,

    /// Production type (generation only)
    pub psr_type: Option<PsrType>,

    /// Start of the Period the point belongs to
    #[serde(with = "instant_format")]
    pub start_time: DateTime<Utc>,

    /// Period resolution
    pub resolution: Resolution,

    /// 1-based offset within the Period
    pub position: u32,

    /// Quantity in MW or price per MWh
    pub value: f64,
}

impl Record {
    /// Timestamp of this point: `start_time + (position - 1) * resolution`
    ///
    /// `None` when the position lies outside the representable date range.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.resolution.timestamp(self.start_time, self.position)
    }
}

/// Idempotence key of a persisted row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NaturalKey {
    /// Country code
    pub country: CountryCode,
    /// Production type, `None` for prices
    pub psr_type: Option<PsrType>,
    /// Period start
    pub start_time: DateTime<Utc>,
    /// Position within the period
    pub position: u32,
}

/// Behaviour shared by enriched rows of every category
pub trait EnrichedRow: Clone + Send + Sync + 'static {
    /// Category of the row
    const CATEGORY: Category;

    /// Column names, in output order
    const COLUMNS: &'static [&'static str];

    /// Natural key used by the destination uniqueness constraint
    fn natural_key(&self) -> NaturalKey;

    /// Measured value (MW or price)
    fn value(&self) -> f64;

    /// Point timestamp, `None` when not representable
    fn timestamp(&self) -> Option<DateTime<Utc>>;
}

/// Enriched generation row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRow {
    pub country: CountryCode,
    pub country_name: String,
    pub bidding_zone: Option<BiddingZone>,
    pub psr_type: PsrType,
    pub generation_type: String,
    #[serde(with = "instant_format")]
    pub start_time: DateTime<Utc>,
    pub resolution: Resolution,
    pub position: u32,
    pub quantity_mw: f64,
}

impl EnrichedRow for GenerationRow {
    const CATEGORY: Category = Category::Generation;

    const COLUMNS: &'static [&'static str] = &[
        "country",
        "country_name",
        "bidding_zone",
        "psr_type",
        "generation_type",
        "start_time",
        "resolution",
        "position",
        "quantity_mw",
    ];

    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            country: self.country.clone(),
            psr_type: Some(self.psr_type.clone()),
            start_time: self.start_time,
            position: self.position,
        }
    }

    fn value(&self) -> f64 {
        self.quantity_mw
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.resolution.timestamp(self.start_time, self.position)
    }
}

/// Enriched day-ahead price row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub country: CountryCode,
    pub country_name: String,
    pub bidding_zone: Option<BiddingZone>,
    #[serde(with = "instant_format")]
    pub start_time: DateTime<Utc>,
    pub resolution: Resolution,
    pub position: u32,
    pub price_eur: f64,
}

impl EnrichedRow for PriceRow {
    const CATEGORY: Category = Category::Prices;

    const COLUMNS: &'static [&'static str] = &[
        "country",
        "country_name",
        "bidding_zone",
        "start_time",
        "resolution",
        "position",
        "price_eur",
    ];

    fn natural_key(&self) -> NaturalKey {
        NaturalKey {
            country: self.country.clone(),
            psr_type: None,
            start_time: self.start_time,
            position: self.position,
        }
    }

    fn value(&self) -> f64 {
        self.price_eur
    }

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.resolution.timestamp(self.start_time, self.position)
    }
}

/// Enriched rows of one partition, typed by category
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichedBatch {
    Generation(Vec<GenerationRow>),
    Prices(Vec<PriceRow>),
}

impl EnrichedBatch {
    /// Category of the rows
    pub fn category(&self) -> Category {
        match self {
            EnrichedBatch::Generation(_) => Category::Generation,
            EnrichedBatch::Prices(_) => Category::Prices,
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            EnrichedBatch::Generation(rows) => rows.len(),
            EnrichedBatch::Prices(rows) => rows.len(),
        }
    }

    /// Whether the batch holds no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record(position: u32) -> Record {
        Record {
            country: CountryCode::new("FR").unwrap(),
            bidding_zone: Some(BiddingZone::new("10YFR-RTE------C").unwrap()),
            category: Category::Generation,
            psr_type: Some(PsrType::new("B16").unwrap()),
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position,
            value: 120.5,
        }
    }

    #[test]
    fn test_record_timestamp() {
        assert_eq!(
            sample_record(2).timestamp(),
            Some(Utc.with_ymd_and_hms(2026, 1, 27, 1, 0, 0).unwrap())
        );
        assert_eq!(sample_record(u32::MAX).timestamp(), None);
    }

    #[test]
    fn test_price_key_has_no_production_type() {
        let row = PriceRow {
            country: CountryCode::new("FR").unwrap(),
            country_name: "France".to_string(),
            bidding_zone: None,
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position: 3,
            price_eur: -4.2,
        };
        let key = row.natural_key();
        assert!(key.psr_type.is_none());
        assert_eq!(key.position, 3);
        assert_eq!(row.value(), -4.2);
    }

    #[test]
    fn test_enriched_batch_len_and_category() {
        let batch = EnrichedBatch::Prices(Vec::new());
        assert!(batch.is_empty());
        assert_eq!(batch.category(), Category::Prices);
    }
}
