//! # ctg-batch: batch comparisons and case processing
//!
//! - [`runner`]: plan-driven pair and straight comparisons on a worker pool,
//!   one report sheet per job, with a `batch_manifest.json` of job outcomes
//! - [`cases`]: case file discovery and the export → filter pipeline

pub mod cases;
pub mod job;
pub mod manifest;
pub mod runner;

pub use cases::{
    classify_case_file, process_case, process_cases, CaseDiscovery, CaseExporter, CaseOutcome,
    CaseSet, ExportError, FolderDiscovery, ProcessOptions, ProcessedCase, SidecarCsvExporter,
};
pub use job::{jobs_from_plan, BatchJob, BatchJobRecord, JobTarget, TaskKind};
pub use manifest::{load_batch_manifest, write_batch_manifest, BatchManifest, BATCH_MANIFEST_FILE};
pub use runner::{run_batch, thread_count, BatchRunnerConfig, BatchSummary, REPORT_STEM};
