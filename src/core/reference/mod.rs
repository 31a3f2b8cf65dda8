//! Reference data used by enrichment

pub mod resolver;

pub use resolver::{
    read_countries, read_production_types, CountryEntry, ProductionTypeEntry, ReferenceResolver,
    ReferenceTable,
};
