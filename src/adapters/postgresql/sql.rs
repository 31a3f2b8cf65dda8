//! SQL text for the PostgreSQL store
//!
//! Table names come from validated configuration (lowercase SQL
//! identifiers), so they are interpolated directly; row values are always
//! bound as parameters.

use crate::core::load::{ConflictPolicy, TableSpec};
use crate::domain::{Category, EtlError, Result};

const MIGRATION: &str = include_str!("../../../migrations/001_energy_tables.sql");

/// Schema DDL for the generation and price tables in `tables`
pub fn render_schema(tables: &[TableSpec]) -> Result<String> {
    let table_of = |category: Category| {
        tables
            .iter()
            .find(|spec| spec.category == category)
            .map(|spec| spec.table.as_str())
            .ok_or_else(|| {
                EtlError::Configuration(format!("No destination table for {category}"))
            })
    };

    Ok(MIGRATION
        .replace("{generation_table}", table_of(Category::Generation)?)
        .replace("{prices_table}", table_of(Category::Prices)?))
}

/// Multi-row upsert of `rows` rows into `spec`
///
/// Each returned row carries one boolean column, `true` when the key was
/// inserted and `false` when an existing row was updated. Conflicting rows
/// that change nothing are not returned.
pub fn render_upsert(spec: &TableSpec, rows: usize, policy: ConflictPolicy) -> String {
    let columns = spec.columns();
    let width = columns.len();

    let values = (0..rows)
        .map(|row| {
            let placeholders = (1..=width)
                .map(|col| format!("${}", row * width + col))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({placeholders})")
        })
        .collect::<Vec<_>>()
        .join(", ");

    let conflict = match policy {
        ConflictPolicy::Ignore => "DO NOTHING".to_string(),
        ConflictPolicy::Update => {
            let assignments = spec
                .mutable_columns
                .iter()
                .map(|c| format!("{c} = EXCLUDED.{c}"))
                .chain(std::iter::once("ingested_at = now()".to_string()))
                .collect::<Vec<_>>()
                .join(", ");
            let current = spec
                .mutable_columns
                .iter()
                .map(|c| format!("{}.{c}", spec.table))
                .collect::<Vec<_>>()
                .join(", ");
            let incoming = spec
                .mutable_columns
                .iter()
                .map(|c| format!("EXCLUDED.{c}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("DO UPDATE SET {assignments} WHERE ({current}) IS DISTINCT FROM ({incoming})")
        }
    };

    format!(
        "INSERT INTO {table} ({columns}) VALUES {values} ON CONFLICT ({keys}) {conflict} RETURNING (xmax = 0) AS inserted",
        table = spec.table,
        columns = columns.join(", "),
        keys = spec.key_columns.join(", "),
    )
}

/// Row count and latest point of a table
pub fn render_status(spec: &TableSpec) -> String {
    format!(
        "SELECT COUNT(*)::BIGINT AS row_count, MAX(point_time) AS latest_point FROM {}",
        spec.table
    )
}
