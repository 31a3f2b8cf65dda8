//! Date-partitioned file layout
//!
//! ```text
//! {data_root}/{category}/{YYYY}/{MM}/{DD}/raw_<COUNTRY>.xml
//!                                        /parsed_<category>.csv
//!                                        /enriched_<category>.csv
//! ```

use crate::domain::{
    Category, CountryCode, EnrichedBatch, EtlError, GenerationRow, Partition, PriceRow, Record,
    Result,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const RAW_PREFIX: &str = "raw_";
const RAW_SUFFIX: &str = ".xml";

/// Country code encoded in a raw document file name (`raw_FR.xml`)
pub fn country_from_raw_name(file_name: &str) -> Option<CountryCode> {
    let code = file_name
        .strip_prefix(RAW_PREFIX)?
        .strip_suffix(RAW_SUFFIX)?;
    CountryCode::new(code).ok()
}

/// A raw document found in a partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub country: CountryCode,
    pub path: PathBuf,
}

/// Paths of the artifacts under a data root
#[derive(Debug, Clone)]
pub struct PartitionLayout {
    data_root: PathBuf,
}

impl PartitionLayout {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Directory holding every artifact of `partition`
    pub fn dir(&self, partition: &Partition) -> PathBuf {
        self.data_root.join(partition.relative_dir())
    }

    pub fn raw_path(&self, partition: &Partition, country: &CountryCode) -> PathBuf {
        self.dir(partition)
            .join(format!("{RAW_PREFIX}{}{RAW_SUFFIX}", country.as_str()))
    }

    pub fn parsed_path(&self, partition: &Partition) -> PathBuf {
        self.dir(partition)
            .join(format!("parsed_{}.csv", partition.category))
    }

    pub fn enriched_path(&self, partition: &Partition) -> PathBuf {
        self.dir(partition)
            .join(format!("enriched_{}.csv", partition.category))
    }

    /// Raw documents of a partition, ordered by country code
    ///
    /// Files that do not follow the `raw_<COUNTRY>.xml` pattern are ignored.
    ///
    /// # Errors
    ///
    /// [`EtlError::SourceMissing`] when the directory does not exist or holds
    /// no raw document.
    pub fn raw_documents(&self, partition: &Partition) -> Result<Vec<RawDocument>> {
        let dir = self.dir(partition);
        if !dir.is_dir() {
            return Err(EtlError::SourceMissing(format!(
                "Partition directory not found: {}",
                dir.display()
            )));
        }

        let mut documents = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            match country_from_raw_name(name) {
                Some(country) if entry.path().is_file() => documents.push(RawDocument {
                    country,
                    path: entry.path(),
                }),
                Some(_) => {}
                None => {
                    if name.starts_with(RAW_PREFIX) {
                        tracing::warn!(file = name, "Ignoring raw file without a country code");
                    }
                }
            }
        }

        if documents.is_empty() {
            return Err(EtlError::SourceMissing(format!(
                "No raw documents in {}",
                dir.display()
            )));
        }
        documents.sort_by(|a, b| a.country.cmp(&b.country));
        Ok(documents)
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(EtlError::SourceMissing(format!(
            "Input not found: {}",
            path.display()
        )))
    }
}

/// Writes rows as CSV with a header, replacing `path` atomically
fn write_csv<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    require_file(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows = Vec::new();
    for (idx, row) in reader.deserialize::<T>().enumerate() {
        rows.push(row.map_err(|e| {
            EtlError::Parse(format!("{} line {}: {}", path.display(), idx + 2, e))
        })?);
    }
    Ok(rows)
}

/// Column order of the parsed CSV
pub const PARSED_COLUMNS: &[&str] = &[
    "country",
    "bidding_zone",
    "category",
    "psr_type",
    "start_time",
    "resolution",
    "position",
    "value",
];

pub fn write_parsed(path: &Path, records: &[Record]) -> Result<()> {
    write_csv(path, PARSED_COLUMNS, records)
}

pub fn read_parsed(path: &Path) -> Result<Vec<Record>> {
    read_csv(path)
}

pub fn write_enriched(path: &Path, batch: &EnrichedBatch) -> Result<()> {
    use crate::domain::EnrichedRow;
    match batch {
        EnrichedBatch::Generation(rows) => write_csv(path, GenerationRow::COLUMNS, rows),
        EnrichedBatch::Prices(rows) => write_csv(path, PriceRow::COLUMNS, rows),
    }
}

pub fn read_enriched(path: &Path, category: Category) -> Result<EnrichedBatch> {
    Ok(match category {
        Category::Generation => EnrichedBatch::Generation(read_csv(path)?),
        Category::Prices => EnrichedBatch::Prices(read_csv(path)?),
    })
}
