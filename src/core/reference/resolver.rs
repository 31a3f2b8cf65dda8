//! Immutable lookup tables for country and production-type metadata

use crate::domain::{BiddingZone, CountryCode, EtlError, PsrType, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One row of the country table: `code,name,default_bidding_zone`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryEntry {
    pub code: CountryCode,
    pub name: String,
    #[serde(default)]
    pub default_bidding_zone: Option<BiddingZone>,
}

/// One row of the production-type table: `code,label`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionTypeEntry {
    pub code: PsrType,
    pub label: String,
}

/// Reference tables a join can run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTable {
    Country,
    ProductionType,
}

impl ReferenceTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceTable::Country => "country",
            ReferenceTable::ProductionType => "production_type",
        }
    }
}

impl fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only reference data for one run
///
/// Construction accepts duplicated codes; a join that depends on a table
/// calls [`ReferenceResolver::ensure_unique`] first, so duplicates fail the
/// join instead of multiplying rows.
#[derive(Debug, Clone, Default)]
pub struct ReferenceResolver {
    countries: Vec<CountryEntry>,
    production_types: Vec<ProductionTypeEntry>,
    country_index: HashMap<CountryCode, usize>,
    production_type_index: HashMap<PsrType, usize>,
}

impl ReferenceResolver {
    /// Builds a resolver from already-parsed rows
    pub fn new(countries: Vec<CountryEntry>, production_types: Vec<ProductionTypeEntry>) -> Self {
        let mut country_index = HashMap::new();
        for (i, entry) in countries.iter().enumerate() {
            country_index.entry(entry.code.clone()).or_insert(i);
        }
        let mut production_type_index = HashMap::new();
        for (i, entry) in production_types.iter().enumerate() {
            production_type_index.entry(entry.code.clone()).or_insert(i);
        }

        Self {
            countries,
            production_types,
            country_index,
            production_type_index,
        }
    }

    /// Loads both tables from CSV files
    ///
    /// # Errors
    ///
    /// [`EtlError::SourceMissing`] when a file does not exist, a parse or
    /// validation error for malformed rows.
    pub fn from_csv_files(
        countries_path: impl AsRef<Path>,
        production_types_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let countries = read_countries(open_reference(countries_path.as_ref())?)?;
        let production_types =
            read_production_types(open_reference(production_types_path.as_ref())?)?;

        let resolver = Self::new(countries, production_types);
        tracing::info!(
            countries = resolver.countries.len(),
            production_types = resolver.production_types.len(),
            "Reference tables loaded"
        );
        Ok(resolver)
    }

    /// Country metadata by code
    pub fn lookup_country(&self, code: &CountryCode) -> Option<&CountryEntry> {
        self.country_index.get(code).map(|&i| &self.countries[i])
    }

    /// Production-type label by code
    pub fn lookup_production_type(&self, code: &PsrType) -> Option<&str> {
        self.production_type_index
            .get(code)
            .map(|&i| self.production_types[i].label.as_str())
    }

    /// Default bidding zone of a country
    ///
    /// Returns `None` for an unknown country or one without a zone, and
    /// [`EtlError::JoinAmbiguous`] when the table lists more than one
    /// distinct zone for the code.
    pub fn default_zone(&self, code: &CountryCode) -> Result<Option<BiddingZone>> {
        let zones: BTreeSet<&BiddingZone> = self
            .countries
            .iter()
            .filter(|entry| &entry.code == code)
            .filter_map(|entry| entry.default_bidding_zone.as_ref())
            .collect();

        if zones.len() > 1 {
            return Err(EtlError::JoinAmbiguous {
                table: ReferenceTable::Country.to_string(),
                keys: vec![format!(
                    "{code} -> {}",
                    zones
                        .iter()
                        .map(|z| z.as_str())
                        .collect::<Vec<_>>()
                        .join(" | ")
                )],
            });
        }
        Ok(zones.into_iter().next().cloned())
    }

    /// Fails if any key of `table` occurs more than once
    pub fn ensure_unique(&self, table: ReferenceTable) -> Result<()> {
        let keys: Vec<String> = match table {
            ReferenceTable::Country => duplicated(self.countries.iter().map(|e| &e.code)),
            ReferenceTable::ProductionType => {
                duplicated(self.production_types.iter().map(|e| &e.code))
            }
        };

        if keys.is_empty() {
            Ok(())
        } else {
            Err(EtlError::JoinAmbiguous {
                table: table.to_string(),
                keys,
            })
        }
    }

    /// Number of country rows
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    /// Number of production-type rows
    pub fn production_type_count(&self) -> usize {
        self.production_types.len()
    }
}

fn duplicated<'a, K>(keys: impl Iterator<Item = &'a K>) -> Vec<String>
where
    K: Ord + fmt::Display + 'a,
{
    let mut seen = BTreeSet::new();
    let mut dups = BTreeSet::new();
    for key in keys {
        if !seen.insert(key) {
            dups.insert(key);
        }
    }
    dups.into_iter().map(ToString::to_string).collect()
}

fn open_reference(path: &Path) -> Result<File> {
    if !path.exists() {
        return Err(EtlError::SourceMissing(format!(
            "Reference table not found: {}",
            path.display()
        )));
    }
    File::open(path)
        .map_err(|e| EtlError::Io(format!("Failed to open {}: {}", path.display(), e)))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader)
}

/// Reads a country table, rejecting rows with an empty name
pub fn read_countries<R: Read>(reader: R) -> Result<Vec<CountryEntry>> {
    let mut rows = Vec::new();
    for (idx, row) in csv_reader(reader).deserialize::<CountryEntry>().enumerate() {
        let line = idx + 2;
        let entry = row.map_err(|e| EtlError::Parse(format!("countries line {line}: {e}")))?;
        if entry.name.trim().is_empty() {
            return Err(EtlError::Validation(format!(
                "countries line {line}: empty name for {}",
                entry.code
            )));
        }
        rows.push(entry);
    }
    Ok(rows)
}

/// Reads a production-type table, rejecting rows with an empty label
pub fn read_production_types<R: Read>(reader: R) -> Result<Vec<ProductionTypeEntry>> {
    let mut rows = Vec::new();
    for (idx, row) in csv_reader(reader)
        .deserialize::<ProductionTypeEntry>()
        .enumerate()
    {
        let line = idx + 2;
        let entry =
            row.map_err(|e| EtlError::Parse(format!("production types line {line}: {e}")))?;
        if entry.label.trim().is_empty() {
            return Err(EtlError::Validation(format!(
                "production types line {line}: empty label for {}",
                entry.code
            )));
        }
        rows.push(entry);
    }
    Ok(rows)
}
