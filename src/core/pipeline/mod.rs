//! Stage orchestration for (category, date) partitions
//!
//! - [`runner`] - `run_parse`, `run_enrich`, `run_load`, `run_validate` and
//!   the concurrent multi-category run
//! - [`summary`] - [`StageSummary`] reported at the end of every stage

pub mod runner;
pub mod summary;

pub use runner::{
    run_all, run_categories, run_enrich, run_load, run_parse, run_validate, PartitionRun,
    RunContext, ValidateTarget,
};
pub use summary::{Stage, StageDetail, StageSummary};
