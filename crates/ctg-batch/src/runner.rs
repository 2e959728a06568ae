use crate::job::{BatchJob, BatchJobRecord, JobTarget};
use crate::manifest::{write_batch_manifest, BatchManifest, BATCH_MANIFEST_FILE};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use ctg_algo::{ComparisonEngine, ScenarioParser};
use ctg_core::{CaseType, ScenarioTable};
use ctg_io::{
    open_directory_sink, open_workbook, render_pair_report, render_straight_report,
    scenario_sheet_names, LayoutOptions, ReportFormat, ReportSheet,
};
use ctg_plan::ResolvedPlan;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stem of the JSON report document; CSV output uses one file per sheet.
pub const REPORT_STEM: &str = "comparison";

pub struct BatchRunnerConfig {
    pub plan: ResolvedPlan,
    pub workbook: PathBuf,
    pub output_root: PathBuf,
    pub parser: ScenarioParser,
    /// Worker threads; 0 means one per CPU.
    pub threads: usize,
}

/// Summary returned after the run so callers can log success/failure counts and manifest location.
pub struct BatchSummary {
    pub success: usize,
    pub failure: usize,
    pub manifest_path: PathBuf,
    pub outputs: Vec<PathBuf>,
    pub jobs: Vec<BatchJobRecord>,
}

/// Sheets parsed once up front; a sheet that failed to load fails only the
/// jobs that read it.
type LoadedSheets = HashMap<String, std::result::Result<ScenarioTable, String>>;

struct JobContext<'a> {
    tables: &'a LoadedSheets,
    scenario_sheets: &'a [String],
    engine: ComparisonEngine,
    case_types: &'a [CaseType],
    layout: LayoutOptions,
}

pub fn thread_count(threads: usize) -> usize {
    if threads == 0 {
        num_cpus::get()
    } else {
        threads
    }
}

pub fn run_batch(config: &BatchRunnerConfig, jobs: &[BatchJob]) -> Result<BatchSummary> {
    fs::create_dir_all(&config.output_root).with_context(|| {
        format!(
            "creating batch output root '{}'",
            config.output_root.display()
        )
    })?;

    // Workbook readers are not shareable across threads: read every input sheet
    // serially, then fan the comparisons out.
    let mut source = open_workbook(&config.workbook)?;
    let needs_discovery = jobs.iter().any(|job| {
        matches!(&job.target, JobTarget::Straight { sheets, .. } if sheets.is_empty())
    });
    let scenario_sheets = if needs_discovery {
        scenario_sheet_names(source.as_mut(), &config.parser)?
    } else {
        Vec::new()
    };
    let wanted: BTreeSet<String> = jobs
        .iter()
        .flat_map(|job| job.input_sheets(&scenario_sheets))
        .collect();
    let mut tables = LoadedSheets::new();
    for name in wanted {
        let loaded = source
            .read_sheet(&name)
            .map(|grid| config.parser.parse(&name, &grid))
            .map_err(|err| format!("{err:#}"));
        if let Err(err) = &loaded {
            warn!(sheet = %name, "failed to load sheet: {err}");
        }
        tables.insert(name, loaded);
    }
    debug!(sheets = tables.len(), "batch input sheets loaded");

    let format = config.plan.format;
    let mut sink = open_directory_sink(format, &config.output_root, REPORT_STEM)?;
    let ctx = JobContext {
        tables: &tables,
        scenario_sheets: &scenario_sheets,
        engine: ComparisonEngine::new(config.plan.threshold),
        case_types: &config.plan.case_types,
        layout: LayoutOptions {
            expandable: config.plan.expandable,
            outline: sink.supports_outline(),
        },
    };

    let pool = ThreadPoolBuilder::new()
        .num_threads(thread_count(config.threads))
        .build()
        .context("building Rayon thread pool for batch runs")?;
    let results: Vec<(BatchJobRecord, Option<ReportSheet>)> = pool.install(|| {
        jobs.par_iter()
            .map(|job| run_job(job, &ctx, format, &config.output_root))
            .collect()
    });

    // Sinks are single-threaded; write in job order so output is deterministic.
    let mut job_records = Vec::with_capacity(results.len());
    for (mut record, sheet) in results {
        if let Some(sheet) = sheet {
            if let Err(err) = sink.write_sheet(&sheet) {
                warn!(job = %record.job_id, "failed to write report sheet: {err:#}");
                record.status = "error".to_string();
                record.error = Some(format!("{err:#}"));
                record.output.clear();
            }
        }
        job_records.push(record);
    }
    let outputs = sink.finish()?;

    let success = job_records.iter().filter(|record| record.is_ok()).count();
    let failure = job_records.len() - success;
    info!(success, failure, "batch comparison finished");

    let manifest = BatchManifest {
        created_at: Utc::now(),
        workbook: config.workbook.display().to_string(),
        threshold: config.plan.threshold,
        num_jobs: job_records.len(),
        success,
        failure,
        outputs: outputs.iter().map(|p| p.display().to_string()).collect(),
        jobs: job_records.clone(),
    };
    let manifest_path = config.output_root.join(BATCH_MANIFEST_FILE);
    write_batch_manifest(&manifest_path, &manifest)?;
    Ok(BatchSummary {
        success,
        failure,
        manifest_path,
        outputs,
        jobs: job_records,
    })
}

fn lookup<'a>(tables: &'a LoadedSheets, name: &str) -> Result<&'a ScenarioTable> {
    match tables.get(name) {
        Some(Ok(table)) => Ok(table),
        Some(Err(err)) => Err(anyhow!("sheet '{name}': {err}")),
        None => Err(anyhow!("sheet '{name}' was not loaded")),
    }
}

fn output_path(format: ReportFormat, root: &Path, sheet: &str) -> PathBuf {
    match format {
        ReportFormat::Csv => root.join(format!("{sheet}.csv")),
        ReportFormat::Json => root.join(format!("{REPORT_STEM}.json")),
    }
}

/// Run one comparison and render its sheet. Failures become an "error" record.
fn run_job(
    job: &BatchJob,
    ctx: &JobContext<'_>,
    format: ReportFormat,
    root: &Path,
) -> (BatchJobRecord, Option<ReportSheet>) {
    let runner = || -> Result<(usize, ReportSheet)> {
        let (count, mut sheet) = match &job.target {
            JobTarget::Pair { left, right } => {
                let l = lookup(ctx.tables, left)?;
                let r = lookup(ctx.tables, right)?;
                let mut records = ctx.engine.compare_pair(l, r);
                records.retain(|rec| ctx.case_types.contains(&rec.case_type));
                let count = records.len();
                (count, render_pair_report(left, right, &records, ctx.layout))
            }
            JobTarget::Straight { sheets, title } => {
                let names = if sheets.is_empty() {
                    ctx.scenario_sheets
                } else {
                    sheets.as_slice()
                };
                if names.is_empty() {
                    return Err(anyhow!("no scenario sheets to compare"));
                }
                let scenarios = names
                    .iter()
                    .map(|name| Ok((name.as_str(), lookup(ctx.tables, name)?)))
                    .collect::<Result<Vec<_>>>()?;
                let records: Vec<_> = ctx
                    .case_types
                    .iter()
                    .flat_map(|case_type| ctx.engine.compare_all(&scenarios, *case_type))
                    .collect();
                let count = records.len();
                (
                    count,
                    render_straight_report(title, names, &records, ctx.layout),
                )
            }
        };
        sheet.name = job.sheet.clone();
        Ok((count, sheet))
    };

    match runner() {
        Ok((records, sheet)) => {
            debug!(job = %job.job_id, records, "batch job finished");
            (
                BatchJobRecord {
                    job_id: job.job_id.clone(),
                    task: job.task,
                    sheet: job.sheet.clone(),
                    status: "ok".to_string(),
                    error: None,
                    records,
                    output: output_path(format, root, &job.sheet).display().to_string(),
                },
                Some(sheet),
            )
        }
        Err(err) => {
            warn!(job = %job.job_id, "batch job failed: {err:#}");
            (
                BatchJobRecord {
                    job_id: job.job_id.clone(),
                    task: job.task,
                    sheet: job.sheet.clone(),
                    status: "error".to_string(),
                    error: Some(format!("{err:#}")),
                    records: 0,
                    output: String::new(),
                },
                None,
            )
        }
    }
}
