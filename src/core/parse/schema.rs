//! Tag contract per document category
//!
//! Every element the parser reads is named here and nowhere else. Tags are
//! matched by local name, so `ns:TimeSeries` and `TimeSeries` are the same.
//! A new document revision should only need a change to this table.

use crate::domain::Category;

/// Element names the parser looks for in one category of document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSchema {
    /// Category produced by documents of this shape
    pub category: Category,

    /// Document types this category is published as (`type` element)
    pub document_types: &'static [&'static str],

    /// Root element of a "no matching data" reply
    pub acknowledgement_root: &'static str,

    /// Repeated series element under the root
    pub series_tag: &'static str,

    /// Zone mRID elements, in precedence order
    pub zone_tags: &'static [&'static str],

    /// Zone elements that mark a series as something other than this category
    /// when none of `zone_tags` is present (consumption of storage units)
    pub excluded_zone_tags: &'static [&'static str],

    /// Path from the series to its production type code
    pub psr_type_path: &'static [&'static str],

    /// Whether a series without a production type is malformed
    pub psr_type_required: bool,

    /// Repeated period element under a series
    pub period_tag: &'static str,

    /// Path from the period to its start instant
    pub start_path: &'static [&'static str],

    /// Resolution element under a period
    pub resolution_tag: &'static str,

    /// Repeated point element under a period
    pub point_tag: &'static str,

    /// Position element under a point
    pub position_tag: &'static str,

    /// Value element aliases under a point, first present wins
    pub value_tags: &'static [&'static str],

    /// Optional explicit instant carried by a point
    pub timestamp_tag: Option<&'static str>,
}

/// Actual generation per production type (A75)
pub const GENERATION_SCHEMA: DocumentSchema = DocumentSchema {
    category: Category::Generation,
    document_types: &["A75"],
    acknowledgement_root: "Acknowledgement_MarketDocument",
    series_tag: "TimeSeries",
    zone_tags: &["inBiddingZone_Domain.mRID", "in_Domain.mRID"],
    excluded_zone_tags: &["outBiddingZone_Domain.mRID", "out_Domain.mRID"],
    psr_type_path: &["MktPSRType", "psrType"],
    psr_type_required: true,
    period_tag: "Period",
    start_path: &["timeInterval", "start"],
    resolution_tag: "resolution",
    point_tag: "Point",
    position_tag: "position",
    value_tags: &["quantity"],
    timestamp_tag: Some("timestamp"),
};

/// Day-ahead prices (A44)
pub const PRICES_SCHEMA: DocumentSchema = DocumentSchema {
    category: Category::Prices,
    document_types: &["A44"],
    acknowledgement_root: "Acknowledgement_MarketDocument",
    series_tag: "TimeSeries",
    zone_tags: &[
        "in_Domain.mRID",
        "out_Domain.mRID",
        "inBiddingZone_Domain.mRID",
    ],
    excluded_zone_tags: &[],
    psr_type_path: &["MktPSRType", "psrType"],
    psr_type_required: false,
    period_tag: "Period",
    start_path: &["timeInterval", "start"],
    resolution_tag: "resolution",
    point_tag: "Point",
    position_tag: "position",
    value_tags: &["price.amount", "price"],
    timestamp_tag: Some("timestamp"),
};

impl DocumentSchema {
    /// Schema for a category
    pub fn for_category(category: Category) -> &'static DocumentSchema {
        match category {
            Category::Generation => &GENERATION_SCHEMA,
            Category::Prices => &PRICES_SCHEMA,
        }
    }

    /// Whether `document_type` is one this schema expects
    pub fn accepts_document_type(&self, document_type: &str) -> bool {
        self.document_types.contains(&document_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lookup_by_category() {
        for category in Category::ALL {
            assert_eq!(DocumentSchema::for_category(category).category, category);
        }
    }

    #[test]
    fn test_only_generation_requires_production_type() {
        assert!(GENERATION_SCHEMA.psr_type_required);
        assert!(!PRICES_SCHEMA.psr_type_required);
    }

    #[test]
    fn test_document_types() {
        assert!(GENERATION_SCHEMA.accepts_document_type("A75"));
        assert!(!GENERATION_SCHEMA.accepts_document_type("A44"));
        assert!(PRICES_SCHEMA.accepts_document_type("A44"));
    }
}
