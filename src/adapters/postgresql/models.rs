//! Row models bound as statement parameters
//!
//! Parameter order follows [`TableSpec::columns`](crate::core::load::TableSpec::columns):
//! key columns first, then mutable columns.

use crate::domain::{EnrichedRow, EtlError, GenerationRow, PriceRow, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tokio_postgres::types::ToSql;

/// A row that can be bound into an upsert statement
pub trait PgRow: Send + Sync {
    /// Parameters in column order
    fn params(&self) -> Vec<&(dyn ToSql + Sync)>;
}

/// Converts a measured value to `NUMERIC` through its shortest decimal form
pub fn to_numeric(value: f64) -> Result<Decimal> {
    if !value.is_finite() {
        return Err(EtlError::Validation(format!(
            "Value {value} cannot be stored as NUMERIC"
        )));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|e| EtlError::Validation(format!("Value {value} out of NUMERIC range: {e}")))
}

fn to_int(value: u32, column: &str) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| EtlError::Validation(format!("{column} {value} exceeds INTEGER range")))
}

fn point_time<R: EnrichedRow>(row: &R) -> Result<DateTime<Utc>> {
    row.timestamp().ok_or_else(|| {
        EtlError::Validation(format!(
            "Point {:?} has no representable timestamp",
            row.natural_key()
        ))
    })
}

/// Generation row in `energy_generation` layout
#[derive(Debug, Clone)]
pub struct PgGenerationRow {
    pub country: String,
    pub psr_type: String,
    pub start_time: DateTime<Utc>,
    pub position: i32,
    pub country_name: String,
    pub bidding_zone: Option<String>,
    pub generation_type: String,
    pub resolution_minutes: i32,
    pub point_time: DateTime<Utc>,
    pub quantity_mw: Decimal,
}

impl PgGenerationRow {
    pub fn from_domain(row: &GenerationRow) -> Result<Self> {
        Ok(Self {
            country: row.country.as_str().to_string(),
            psr_type: row.psr_type.as_str().to_string(),
            start_time: row.start_time,
            position: to_int(row.position, "position")?,
            country_name: row.country_name.clone(),
            bidding_zone: row.bidding_zone.as_ref().map(|z| z.as_str().to_string()),
            generation_type: row.generation_type.clone(),
            resolution_minutes: to_int(row.resolution.minutes(), "resolution")?,
            point_time: point_time(row)?,
            quantity_mw: to_numeric(row.quantity_mw)?,
        })
    }
}

impl PgRow for PgGenerationRow {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.country,
            &self.psr_type,
            &self.start_time,
            &self.position,
            &self.country_name,
            &self.bidding_zone,
            &self.generation_type,
            &self.resolution_minutes,
            &self.point_time,
            &self.quantity_mw,
        ]
    }
}

/// Price row in `energy_prices` layout
#[derive(Debug, Clone)]
pub struct PgPriceRow {
    pub country: String,
    pub start_time: DateTime<Utc>,
    pub position: i32,
    pub country_name: String,
    pub bidding_zone: Option<String>,
    pub resolution_minutes: i32,
    pub point_time: DateTime<Utc>,
    pub price_eur: Decimal,
}

impl PgPriceRow {
    pub fn from_domain(row: &PriceRow) -> Result<Self> {
        Ok(Self {
            country: row.country.as_str().to_string(),
            start_time: row.start_time,
            position: to_int(row.position, "position")?,
            country_name: row.country_name.clone(),
            bidding_zone: row.bidding_zone.as_ref().map(|z| z.as_str().to_string()),
            resolution_minutes: to_int(row.resolution.minutes(), "resolution")?,
            point_time: point_time(row)?,
            price_eur: to_numeric(row.price_eur)?,
        })
    }
}

impl PgRow for PgPriceRow {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.country,
            &self.start_time,
            &self.position,
            &self.country_name,
            &self.bidding_zone,
            &self.resolution_minutes,
            &self.point_time,
            &self.price_eur,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::load::TableSpec;
    use crate::domain::{Category, CountryCode, PsrType, Resolution};
    use chrono::TimeZone;

    fn solar() -> GenerationRow {
        GenerationRow {
            country: CountryCode::new("FR").unwrap(),
            country_name: "France".to_string(),
            bidding_zone: None,
            psr_type: PsrType::new("B16").unwrap(),
            generation_type: "Solar".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(15).unwrap(),
            position: 5,
            quantity_mw: 1234.5,
        }
    }

    #[test]
    fn test_to_numeric() {
        assert_eq!(to_numeric(0.1).unwrap(), Decimal::from_str("0.1").unwrap());
        assert_eq!(to_numeric(-12.25).unwrap().to_string(), "-12.25");
        assert!(to_numeric(f64::NAN).is_err());
        assert!(to_numeric(f64::INFINITY).is_err());
    }

    #[test]
    fn test_generation_row_conversion() {
        let row = PgGenerationRow::from_domain(&solar()).unwrap();
        assert_eq!(row.point_time, Utc.with_ymd_and_hms(2026, 1, 27, 1, 0, 0).unwrap());
        assert_eq!(row.resolution_minutes, 15);
        assert_eq!(row.quantity_mw.to_string(), "1234.5");
        assert!(row.bidding_zone.is_none());
    }

    #[test]
    fn test_unrepresentable_point_time_is_rejected() {
        let mut row = solar();
        row.resolution = Resolution::from_minutes(1440).unwrap();
        row.position = 100_000_000;
        let result = PgGenerationRow::from_domain(&row);
        assert!(matches!(result, Err(EtlError::Validation(_))));
    }

    #[test]
    fn test_param_count_matches_columns() {
        let gen = PgGenerationRow::from_domain(&solar()).unwrap();
        assert_eq!(
            gen.params().len(),
            TableSpec::new(Category::Generation, "g").columns().len()
        );

        let price = PgPriceRow::from_domain(&PriceRow {
            country: CountryCode::new("ES").unwrap(),
            country_name: "Spain".to_string(),
            bidding_zone: None,
            start_time: Utc.with_ymd_and_hms(2026, 1, 27, 0, 0, 0).unwrap(),
            resolution: Resolution::from_minutes(60).unwrap(),
            position: 1,
            price_eur: 55.0,
        })
        .unwrap();
        assert_eq!(
            price.params().len(),
            TableSpec::new(Category::Prices, "p").columns().len()
        );
    }
}
