//! Data categories handled by the pipeline

use crate::domain::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data category of a document, record or table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Actual generation per production type (document type A75)
    Generation,
    /// Day-ahead prices (document type A44)
    Prices,
}

impl Category {
    /// All categories, in processing order
    pub const ALL: [Category; 2] = [Category::Generation, Category::Prices];

    /// Lowercase name used in partition paths and artifact names
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Generation => "generation",
            Category::Prices => "prices",
        }
    }

    /// Whether records of this category carry a production type
    pub fn has_production_type(&self) -> bool {
        matches!(self, Category::Generation)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "generation" => Ok(Self::Generation),
            "prices" | "price" => Ok(Self::Prices),
            _ => Err(EtlError::Configuration(format!(
                "Invalid category: {s}. Expected 'generation' or 'prices'"
            ))),
        }
    }
}
