//! Case files: finding them in a study folder, getting their violation
//! exports, and reducing each export to its filtered copy.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ctg_algo::{FilterConfig, FilterReport, RowFilterPipeline};
use ctg_core::CaseType;
use ctg_io::{export_path_for_case, filtered_path, read_raw_export, write_raw_table};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::runner::thread_count;

pub const CASE_EXTENSION: &str = "pwb";

/// Failure to obtain a violation export. Fatal for that case only.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("case file '{0}' not found")]
    CaseNotFound(PathBuf),

    #[error("violation export for '{case}' is missing (expected '{expected}')")]
    Missing { case: PathBuf, expected: PathBuf },

    #[error("exporting '{case}' failed: {message}")]
    Failed { case: PathBuf, message: String },
}

/// Produces the raw violation CSV for a case file.
pub trait CaseExporter: Sync {
    fn export(&self, case_file: &Path) -> Result<PathBuf, ExportError>;
}

/// Picks up the `<stem>_ViolationCTG.csv` that the external export tool
/// leaves beside the case file.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarCsvExporter;

impl CaseExporter for SidecarCsvExporter {
    fn export(&self, case_file: &Path) -> Result<PathBuf, ExportError> {
        if !case_file.is_file() {
            return Err(ExportError::CaseNotFound(case_file.to_path_buf()));
        }
        let expected = export_path_for_case(case_file);
        if expected.is_file() {
            Ok(expected)
        } else {
            Err(ExportError::Missing {
                case: case_file.to_path_buf(),
                expected,
            })
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessOptions {
    #[serde(default)]
    pub filter: FilterConfig,
    /// Remove the raw export once the filtered copy is written.
    #[serde(default)]
    pub delete_original: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedCase {
    pub case_file: PathBuf,
    pub export: PathBuf,
    pub filtered: PathBuf,
    pub report: FilterReport,
    pub deleted_original: bool,
}

/// Export one case, filter the export and write `<export>_Filtered.csv`.
pub fn process_case(
    case_file: &Path,
    exporter: &dyn CaseExporter,
    options: &ProcessOptions,
) -> Result<ProcessedCase> {
    let export = exporter.export(case_file)?;
    let raw = read_raw_export(&export)?;
    if raw.row_count() == 0 {
        warn!(export = %export.display(), "export has a header but no data rows");
    }

    let (filtered_table, report) = RowFilterPipeline::new(options.filter.clone()).apply(&raw);
    let filtered = filtered_path(&export);
    write_raw_table(&filtered, &filtered_table)?;

    let deleted_original = if options.delete_original {
        fs::remove_file(&export)
            .with_context(|| format!("deleting original export '{}'", export.display()))?;
        true
    } else {
        false
    };
    info!(
        case = %case_file.display(),
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        "case processed"
    );
    Ok(ProcessedCase {
        case_file: case_file.to_path_buf(),
        export,
        filtered,
        report,
        deleted_original,
    })
}

/// Per-case result of a processing run.
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub case_file: PathBuf,
    pub case_type: Option<CaseType>,
    pub status: String,
    pub error: Option<String>,
    pub processed: Option<ProcessedCase>,
}

impl CaseOutcome {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Process every case on a worker pool; one failing case never stops the others.
/// Outcomes come back in input order.
pub fn process_cases(
    cases: &[PathBuf],
    exporter: &dyn CaseExporter,
    options: &ProcessOptions,
    threads: usize,
) -> Result<Vec<CaseOutcome>> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count(threads))
        .build()
        .context("building Rayon thread pool for case processing")?;
    Ok(pool.install(|| {
        cases
            .par_iter()
            .map(|case_file| {
                let case_type = case_file
                    .file_name()
                    .and_then(|name| name.to_str())
                    .and_then(classify_case_file);
                match process_case(case_file, exporter, options) {
                    Ok(processed) => CaseOutcome {
                        case_file: case_file.clone(),
                        case_type,
                        status: "ok".to_string(),
                        error: None,
                        processed: Some(processed),
                    },
                    Err(err) => {
                        warn!(case = %case_file.display(), "case processing failed: {err:#}");
                        CaseOutcome {
                            case_file: case_file.clone(),
                            case_type,
                            status: "error".to_string(),
                            error: Some(format!("{err:#}")),
                            processed: None,
                        }
                    }
                }
            })
            .collect()
    }))
}

/// Case type of a case file, by the first pattern its name contains.
pub fn classify_case_file(file_name: &str) -> Option<CaseType> {
    CaseType::ALL
        .into_iter()
        .find(|case_type| file_name.contains(case_type.file_pattern()))
}

/// Case files found for a study, at most one per case type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CaseSet {
    pub cases: BTreeMap<CaseType, PathBuf>,
    /// Further files of an already-claimed case type, in scan order.
    pub duplicates: Vec<(CaseType, PathBuf)>,
    /// Case files matching no known pattern.
    pub unmatched: Vec<PathBuf>,
}

impl CaseSet {
    /// Case files in canonical case-type order.
    pub fn files(&self) -> Vec<PathBuf> {
        self.cases.values().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

pub trait CaseDiscovery {
    fn discover(&self, root: &Path) -> Result<CaseSet>;
}

/// Scans one folder (not recursively) for `.pwb` files in name order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FolderDiscovery;

impl CaseDiscovery for FolderDiscovery {
    fn discover(&self, root: &Path) -> Result<CaseSet> {
        let mut set = CaseSet::default();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for entry in walker {
            let entry =
                entry.with_context(|| format!("scanning case folder '{}'", root.display()))?;
            if !entry.file_type().is_file() || !is_case_file(entry.path()) {
                continue;
            }
            let path = entry.path().to_path_buf();
            let Some(case_type) = entry.file_name().to_str().and_then(classify_case_file) else {
                set.unmatched.push(path);
                continue;
            };
            if set.cases.contains_key(&case_type) {
                warn!(
                    case_type = %case_type,
                    file = %path.display(),
                    "duplicate case file ignored"
                );
                set.duplicates.push((case_type, path));
            } else {
                set.cases.insert(case_type, path);
            }
        }
        Ok(set)
    }
}

fn is_case_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(CASE_EXTENSION))
}
