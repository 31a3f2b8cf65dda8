//! Conflict handling and table layout for the loader

use crate::config::LoaderConfig;
use crate::domain::{Category, EnrichedRow, NaturalKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What happens when a natural key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Last write wins on the mutable columns
    #[default]
    Update,
    /// First write wins; later rows with the same key are dropped
    Ignore,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictPolicy::Update => "update",
            ConflictPolicy::Ignore => "ignore",
        }
    }

    /// Collapses rows sharing a natural key, keeping the occurrence this
    /// policy selects. Returns the surviving rows, in first-seen key order,
    /// and the number of rows dropped.
    pub fn collapse<R: EnrichedRow>(&self, rows: Vec<R>) -> (Vec<R>, usize) {
        let mut index: HashMap<NaturalKey, usize> = HashMap::with_capacity(rows.len());
        let mut kept: Vec<R> = Vec::with_capacity(rows.len());
        let mut collapsed = 0;

        for row in rows {
            match index.get(&row.natural_key()) {
                Some(&slot) => {
                    collapsed += 1;
                    if *self == ConflictPolicy::Update {
                        kept[slot] = row;
                    }
                }
                None => {
                    index.insert(row.natural_key(), kept.len());
                    kept.push(row);
                }
            }
        }

        (kept, collapsed)
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "update" => Ok(ConflictPolicy::Update),
            "ignore" => Ok(ConflictPolicy::Ignore),
            other => Err(format!(
                "Invalid conflict policy '{other}', expected 'update' or 'ignore'"
            )),
        }
    }
}

/// Destination table of one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub category: Category,
    pub table: String,
    /// Columns of the uniqueness constraint
    pub key_columns: &'static [&'static str],
    /// Columns rewritten by an `update` conflict
    pub mutable_columns: &'static [&'static str],
}

const GENERATION_KEY: &[&str] = &["country", "psr_type", "start_time", "position"];
const GENERATION_MUTABLE: &[&str] = &[
    "country_name",
    "bidding_zone",
    "generation_type",
    "resolution_minutes",
    "point_time",
    "quantity_mw",
];

const PRICES_KEY: &[&str] = &["country", "start_time", "position"];
const PRICES_MUTABLE: &[&str] = &[
    "country_name",
    "bidding_zone",
    "resolution_minutes",
    "point_time",
    "price_eur",
];

impl TableSpec {
    /// Layout of `category` stored in `table`
    pub fn new(category: Category, table: impl Into<String>) -> Self {
        let (key_columns, mutable_columns) = match category {
            Category::Generation => (GENERATION_KEY, GENERATION_MUTABLE),
            Category::Prices => (PRICES_KEY, PRICES_MUTABLE),
        };
        Self {
            category,
            table: table.into(),
            key_columns,
            mutable_columns,
        }
    }

    /// Layout of `category` using the configured table name
    pub fn from_config(category: Category, loader: &LoaderConfig) -> Self {
        Self::new(category, loader.table_for(category))
    }

    /// Every written column: key columns followed by mutable columns
    pub fn columns(&self) -> Vec<&'static str> {
        self.key_columns
            .iter()
            .chain(self.mutable_columns.iter())
            .copied()
            .collect()
    }
}
