//! Where each output column comes from
//!
//! When the pipeline and a reference table both know a value, the source
//! listed here decides which one lands in the output.

use crate::core::reference::ReferenceTable;
use crate::domain::Category;

/// Origin of an output column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// Carried over from the parsed record; reference columns of the same
    /// name are discarded
    Pipeline,
    /// Taken from the parsed record, filled from a reference table when absent
    PipelineOrReference(ReferenceTable),
    /// Looked up in a reference table
    Reference(ReferenceTable),
    /// Renamed from the record's `value`
    Value,
}

impl FieldSource {
    /// Reference table this source reads, if any
    pub fn table(&self) -> Option<ReferenceTable> {
        match self {
            FieldSource::PipelineOrReference(table) | FieldSource::Reference(table) => {
                Some(*table)
            }
            FieldSource::Pipeline | FieldSource::Value => None,
        }
    }
}

/// One output column and its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputField {
    pub name: &'static str,
    pub source: FieldSource,
}

const fn field(name: &'static str, source: FieldSource) -> OutputField {
    OutputField { name, source }
}

/// Generation output columns, in order
pub const GENERATION_FIELDS: &[OutputField] = &[
    field("country", FieldSource::Pipeline),
    field("country_name", FieldSource::Reference(ReferenceTable::Country)),
    field(
        "bidding_zone",
        FieldSource::PipelineOrReference(ReferenceTable::Country),
    ),
    field("psr_type", FieldSource::Pipeline),
    field(
        "generation_type",
        FieldSource::Reference(ReferenceTable::ProductionType),
    ),
    field("start_time", FieldSource::Pipeline),
    field("resolution", FieldSource::Pipeline),
    field("position", FieldSource::Pipeline),
    field("quantity_mw", FieldSource::Value),
];

/// Price output columns, in order
pub const PRICE_FIELDS: &[OutputField] = &[
    field("country", FieldSource::Pipeline),
    field("country_name", FieldSource::Reference(ReferenceTable::Country)),
    field(
        "bidding_zone",
        FieldSource::PipelineOrReference(ReferenceTable::Country),
    ),
    field("start_time", FieldSource::Pipeline),
    field("resolution", FieldSource::Pipeline),
    field("position", FieldSource::Pipeline),
    field("price_eur", FieldSource::Value),
];

/// Output columns of a category
pub fn fields_for(category: Category) -> &'static [OutputField] {
    match category {
        Category::Generation => GENERATION_FIELDS,
        Category::Prices => PRICE_FIELDS,
    }
}

/// Reference tables a category joins against, without repeats
pub fn joined_tables(category: Category) -> Vec<ReferenceTable> {
    let mut tables = Vec::new();
    for table in fields_for(category).iter().filter_map(|f| f.source.table()) {
        if !tables.contains(&table) {
            tables.push(table);
        }
    }
    tables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EnrichedRow, GenerationRow, PriceRow};

    fn names(fields: &[OutputField]) -> Vec<&'static str> {
        fields.iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_field_tables_match_row_columns() {
        assert_eq!(names(GENERATION_FIELDS), GenerationRow::COLUMNS.to_vec());
        assert_eq!(names(PRICE_FIELDS), PriceRow::COLUMNS.to_vec());
        assert_eq!(GENERATION_FIELDS.len(), 9);
    }

    #[test]
    fn test_pipeline_country_wins() {
        let country = GENERATION_FIELDS
            .iter()
            .find(|f| f.name == "country")
            .unwrap();
        assert_eq!(country.source, FieldSource::Pipeline);
    }

    #[test]
    fn test_joined_tables() {
        assert_eq!(
            joined_tables(Category::Generation),
            vec![ReferenceTable::Country, ReferenceTable::ProductionType]
        );
        assert_eq!(joined_tables(Category::Prices), vec![ReferenceTable::Country]);
    }
}
