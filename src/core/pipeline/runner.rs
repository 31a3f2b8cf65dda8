//! Stage runners
//!
//! Each stage reads the previous stage's artifact from the partition
//! directory, so any stage can be rerun on its own for a date.

use crate::adapters::files::{self, PartitionLayout};
use crate::core::enrich::Enricher;
use crate::core::load::Loader;
use crate::core::parse::{parse_document, ParseContext, ParseStats};
use crate::core::pipeline::summary::{Stage, StageDetail, StageSummary};
use crate::core::reference::ReferenceResolver;
use crate::core::validate::{validate_enriched, validate_parsed};
use crate::domain::{Category, EtlError, Partition, Result};
use crate::{log_stage_complete, log_stage_start};
use chrono::NaiveDate;
use futures::future::join_all;
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// State shared by every stage of one invocation
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: Uuid,
    pub layout: PartitionLayout,
}

impl RunContext {
    pub fn new(layout: PartitionLayout) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            layout,
        }
    }

    fn span(&self, stage: Stage, partition: &Partition) -> tracing::Span {
        tracing::info_span!(
            "stage",
            run_id = %self.run_id,
            stage = stage.as_str(),
            category = partition.category.as_str(),
            date = %partition.date
        )
    }
}

/// Which artifact `validate` inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateTarget {
    Parsed,
    Enriched,
}

fn empty_output(stage: Stage, partition: &Partition) -> EtlError {
    EtlError::EmptyOutput(format!("{stage} produced no rows for {partition}"))
}

/// Parses every raw document of a partition into `parsed_<category>.csv`
pub fn run_parse(ctx: &RunContext, partition: &Partition) -> Result<StageSummary> {
    let span = ctx.span(Stage::Parse, partition);
    let _enter = span.enter();
    let started = Instant::now();
    log_stage_start!(Stage::Parse.as_str(), partition);

    let result = (|| -> Result<StageSummary> {
        let documents = ctx.layout.raw_documents(partition)?;
        let mut records = Vec::new();
        let mut stats = ParseStats::default();

        for document in &documents {
            let bytes = fs::read(&document.path)?;
            let source = document
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| document.path.display().to_string());
            let mut stream = parse_document(
                bytes,
                ParseContext {
                    category: partition.category,
                    country: document.country.clone(),
                    source,
                },
            );
            for record in stream.by_ref() {
                records.push(record?);
            }
            stats.merge(stream.stats());
        }

        if records.is_empty() {
            return Err(empty_output(Stage::Parse, partition));
        }
        files::write_parsed(&ctx.layout.parsed_path(partition), &records)?;

        Ok(StageSummary::new(
            ctx.run_id,
            Stage::Parse,
            partition,
            documents.len(),
            records.len(),
            started.elapsed(),
            StageDetail::Parse(stats),
        ))
    })();

    let summary = result.map_err(|e| e.in_stage(Stage::Parse.as_str(), partition))?;
    log_stage_complete!(Stage::Parse.as_str(), partition, summary.rows_out, started.elapsed());
    Ok(summary)
}

/// Joins the parsed partition against the reference tables into
/// `enriched_<category>.csv`
pub fn run_enrich(
    ctx: &RunContext,
    resolver: &ReferenceResolver,
    partition: &Partition,
) -> Result<StageSummary> {
    let span = ctx.span(Stage::Enrich, partition);
    let _enter = span.enter();
    let started = Instant::now();
    log_stage_start!(Stage::Enrich.as_str(), partition);

    let result = (|| -> Result<StageSummary> {
        let records = files::read_parsed(&ctx.layout.parsed_path(partition))?;
        let rows_in = records.len();
        let enrichment = Enricher::new(resolver).enrich(partition.category, records)?;

        if enrichment.rows.is_empty() {
            return Err(empty_output(Stage::Enrich, partition));
        }
        files::write_enriched(&ctx.layout.enriched_path(partition), &enrichment.rows)?;

        Ok(StageSummary::new(
            ctx.run_id,
            Stage::Enrich,
            partition,
            rows_in,
            enrichment.rows.len(),
            started.elapsed(),
            StageDetail::Enrich(enrichment.unresolved),
        ))
    })();

    let summary = result.map_err(|e| e.in_stage(Stage::Enrich.as_str(), partition))?;
    log_stage_complete!(Stage::Enrich.as_str(), partition, summary.rows_out, started.elapsed());
    Ok(summary)
}

/// Upserts the enriched partition
///
/// The caller runs [`Loader::prepare`] once before loading partitions.
pub async fn run_load(
    ctx: &RunContext,
    loader: &Loader,
    partition: &Partition,
) -> Result<StageSummary> {
    let span = ctx.span(Stage::Load, partition);
    let started = Instant::now();
    log_stage_start!(Stage::Load.as_str(), partition);

    let summary = load_partition(ctx, loader, partition, started)
        .instrument(span)
        .await
        .map_err(|e| e.in_stage(Stage::Load.as_str(), partition))?;
    log_stage_complete!(Stage::Load.as_str(), partition, summary.rows_out, started.elapsed());
    Ok(summary)
}

async fn load_partition(
    ctx: &RunContext,
    loader: &Loader,
    partition: &Partition,
    started: Instant,
) -> Result<StageSummary> {
    let batch = files::read_enriched(&ctx.layout.enriched_path(partition), partition.category)?;
    if batch.is_empty() {
        return Err(empty_output(Stage::Load, partition));
    }
    let rows_in = batch.len();
    let outcome = loader.load(batch).await?;

    Ok(StageSummary::new(
        ctx.run_id,
        Stage::Load,
        partition,
        rows_in,
        outcome.submitted,
        started.elapsed(),
        StageDetail::Load(outcome),
    ))
}

/// Runs the structural checks on a parsed or enriched partition
///
/// A report with failures is still returned as `Ok`; the caller decides
/// whether failures are fatal.
pub fn run_validate(
    ctx: &RunContext,
    partition: &Partition,
    target: ValidateTarget,
) -> Result<StageSummary> {
    let span = ctx.span(Stage::Validate, partition);
    let _enter = span.enter();
    let started = Instant::now();
    log_stage_start!(Stage::Validate.as_str(), partition);

    let result = (|| -> Result<StageSummary> {
        let report = match target {
            ValidateTarget::Parsed => {
                let records = files::read_parsed(&ctx.layout.parsed_path(partition))?;
                validate_parsed(partition, &records)
            }
            ValidateTarget::Enriched => {
                let batch = files::read_enriched(
                    &ctx.layout.enriched_path(partition),
                    partition.category,
                )?;
                validate_enriched(partition, &batch)
            }
        };
        let rows = report.rows;
        let passed = rows.saturating_sub(report.failure_count());

        Ok(StageSummary::new(
            ctx.run_id,
            Stage::Validate,
            partition,
            rows,
            passed,
            started.elapsed(),
            StageDetail::Validate(report),
        ))
    })();

    let summary = result.map_err(|e| e.in_stage(Stage::Validate.as_str(), partition))?;
    log_stage_complete!(Stage::Validate.as_str(), partition, summary.rows_out, started.elapsed());
    Ok(summary)
}

async fn blocking<T, F>(stage: Stage, partition: Partition, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        EtlError::Io(format!("{stage} task for {partition} did not complete: {e}"))
            .in_stage(stage.as_str(), partition)
    })?
}

/// Parse, enrich and load one partition in sequence
pub async fn run_all(
    ctx: &RunContext,
    resolver: Arc<ReferenceResolver>,
    loader: &Loader,
    partition: Partition,
) -> Result<Vec<StageSummary>> {
    let mut summaries = Vec::with_capacity(3);

    let parse_ctx = ctx.clone();
    summaries.push(
        blocking(Stage::Parse, partition, move || {
            run_parse(&parse_ctx, &partition)
        })
        .await?,
    );

    let enrich_ctx = ctx.clone();
    summaries.push(
        blocking(Stage::Enrich, partition, move || {
            run_enrich(&enrich_ctx, &resolver, &partition)
        })
        .await?,
    );

    summaries.push(run_load(ctx, loader, &partition).await?);
    Ok(summaries)
}

/// Result of one partition in a multi-category run
#[derive(Debug)]
pub struct PartitionRun {
    pub partition: Partition,
    pub result: Result<Vec<StageSummary>>,
}

/// Runs every category for `date` concurrently
///
/// Categories share the resolver and the loader's store. A failing category
/// does not stop the others; each result carries its own partition.
pub async fn run_categories(
    ctx: &RunContext,
    resolver: Arc<ReferenceResolver>,
    loader: &Loader,
    categories: &[Category],
    date: NaiveDate,
) -> Vec<PartitionRun> {
    let runs = categories.iter().map(|&category| {
        let partition = Partition::new(category, date);
        let resolver = Arc::clone(&resolver);
        async move {
            let result = run_all(ctx, resolver, loader, partition).await;
            if let Err(ref e) = result {
                tracing::error!(
                    run_id = %ctx.run_id,
                    partition = %partition,
                    error = %e,
                    "Partition failed"
                );
            }
            PartitionRun { partition, result }
        }
    });
    join_all(runs).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::MemoryStore;
    use crate::core::load::{ConflictPolicy, LoaderSettings, TableSpec};
    use crate::core::reference::{read_countries, read_production_types};
    use crate::config::LoaderConfig;
    use crate::domain::CountryCode;
    use tempfile::TempDir;

    const FR_PRICES: &str = r#"<Publication_MarketDocument xmlns="urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3">
  <type>A44</type>
  <TimeSeries>
    <in_Domain.mRID codingScheme="A01">10YFR-RTE------C</in_Domain.mRID>
    <Period>
      <timeInterval><start>2026-01-27T00:00Z</start><end>2026-01-27T02:00Z</end></timeInterval>
      <resolution>PT60M</resolution>
      <Point><position>1</position><price.amount>81.5</price.amount></Point>
      <Point><position>2</position><price.amount>79.25</price.amount></Point>
    </Period>
  </TimeSeries>
</Publication_MarketDocument>"#;

    fn partition() -> Partition {
        Partition::new(Category::Prices, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap())
    }

    fn resolver() -> ReferenceResolver {
        ReferenceResolver::new(
            read_countries("code,name,default_bidding_zone\nFR,France,10YFR-RTE------C\n".as_bytes())
                .unwrap(),
            read_production_types("code,label\nB16,Solar\n".as_bytes()).unwrap(),
        )
    }

    fn setup() -> (TempDir, RunContext) {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(PartitionLayout::new(dir.path()));
        let p = partition();
        fs::create_dir_all(ctx.layout.dir(&p)).unwrap();
        fs::write(
            ctx.layout.raw_path(&p, &CountryCode::new("FR").unwrap()),
            FR_PRICES,
        )
        .unwrap();
        (dir, ctx)
    }

    fn loader(store: Arc<MemoryStore>) -> Loader {
        let config = LoaderConfig::default();
        Loader::new(
            store,
            LoaderSettings {
                batch_size: 1000,
                conflict_policy: ConflictPolicy::Update,
                dry_run: false,
                generation: TableSpec::from_config(Category::Generation, &config),
                prices: TableSpec::from_config(Category::Prices, &config),
            },
        )
    }

    #[test]
    fn test_parse_then_enrich() {
        let (_dir, ctx) = setup();
        let parsed = run_parse(&ctx, &partition()).unwrap();
        assert_eq!(parsed.rows_in, 1);
        assert_eq!(parsed.rows_out, 2);
        assert!(ctx.layout.parsed_path(&partition()).exists());

        let enriched = run_enrich(&ctx, &resolver(), &partition()).unwrap();
        assert_eq!(enriched.rows_out, 2);
        match enriched.detail {
            StageDetail::Enrich(unresolved) => assert_eq!(unresolved.total(), 0),
            other => panic!("unexpected detail {other:?}"),
        }

        let validated = run_validate(&ctx, &partition(), ValidateTarget::Enriched).unwrap();
        assert_eq!(validated.rows_out, 2);
    }

    #[test]
    fn test_missing_partition_names_stage() {
        let dir = TempDir::new().unwrap();
        let ctx = RunContext::new(PartitionLayout::new(dir.path()));
        let err = run_parse(&ctx, &partition()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.to_string(),
            format!("parse stage failed for partition prices/2026/01/27: {}", err.root())
        );
    }

    #[test]
    fn test_acknowledgement_only_is_empty_output() {
        let (_dir, ctx) = setup();
        fs::write(
            ctx.layout.raw_path(&partition(), &CountryCode::new("FR").unwrap()),
            "<Acknowledgement_MarketDocument><Reason><text>No matching data found</text></Reason></Acknowledgement_MarketDocument>",
        )
        .unwrap();
        let err = run_parse(&ctx, &partition()).unwrap_err();
        assert!(matches!(err.root(), EtlError::EmptyOutput(_)));
    }

    #[tokio::test]
    async fn test_run_all_is_idempotent() {
        let (_dir, ctx) = setup();
        let store = Arc::new(MemoryStore::new());
        let loader = loader(store.clone());
        loader.prepare().await.unwrap();
        let resolver = Arc::new(resolver());

        let first = run_all(&ctx, resolver.clone(), &loader, partition())
            .await
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[2].rows_out, 2);

        let second = run_all(&ctx, resolver, &loader, partition()).await.unwrap();
        match &second[2].detail {
            StageDetail::Load(outcome) => {
                assert_eq!(outcome.inserted, 0);
                assert_eq!(outcome.updated, 0);
                assert_eq!(outcome.unchanged, 2);
            }
            other => panic!("unexpected detail {other:?}"),
        }
        assert_eq!(store.price_rows("energy_prices").await.len(), 2);
    }

    #[tokio::test]
    async fn test_run_categories_isolates_failures() {
        let (_dir, ctx) = setup();
        let store = Arc::new(MemoryStore::new());
        let loader = loader(store);
        loader.prepare().await.unwrap();

        let runs = run_categories(
            &ctx,
            Arc::new(resolver()),
            &loader,
            &Category::ALL,
            partition().date,
        )
        .await;
        assert_eq!(runs.len(), 2);
        let generation = runs
            .iter()
            .find(|r| r.partition.category == Category::Generation)
            .unwrap();
        assert!(generation.result.is_err());
        let prices = runs
            .iter()
            .find(|r| r.partition.category == Category::Prices)
            .unwrap();
        assert!(prices.result.is_ok());
    }
}
