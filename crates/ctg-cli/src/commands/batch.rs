use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use ctg_algo::ScenarioParser;
use ctg_batch::{jobs_from_plan, run_batch, BatchRunnerConfig};
use ctg_io::open_workbook;
use ctg_plan::{load_plan_from_path, resolve_plan};
use tracing::warn;

use crate::commands::telemetry::record_run_timed;
use crate::commands::util::parse_threads;

/// A relative `workbook` in a plan is resolved against the plan's directory.
fn plan_workbook(plan_path: &Path, workbook: &str) -> PathBuf {
    let path = PathBuf::from(workbook);
    if path.is_absolute() {
        return path;
    }
    plan_path
        .parent()
        .map(|dir| dir.join(&path))
        .unwrap_or(path)
}

pub fn handle(
    plan_path: &Path,
    workbook: Option<&Path>,
    out: &Path,
    threads: &str,
    parser: &ScenarioParser,
) -> Result<()> {
    let start = Instant::now();
    let mut workbook_used = None;
    let mut summary = None;
    let res = (|| -> Result<()> {
        let threads = parse_threads(threads)?;
        let plan = load_plan_from_path(plan_path)?;
        let workbook = match (workbook, plan.workbook.as_deref()) {
            (Some(path), _) => path.to_path_buf(),
            (None, Some(name)) => plan_workbook(plan_path, name),
            (None, None) => {
                return Err(anyhow!(
                    "plan '{}' names no workbook; pass --workbook",
                    plan_path.display()
                ))
            }
        };
        let available = open_workbook(&workbook)?.sheet_names();
        let resolved = resolve_plan(&plan, Some(&available))?;
        let jobs = jobs_from_plan(&resolved);
        workbook_used = Some(workbook.clone());

        let config = BatchRunnerConfig {
            plan: resolved,
            workbook,
            output_root: out.to_path_buf(),
            parser: parser.clone(),
            threads,
        };
        let batch_summary = run_batch(&config, &jobs)?;
        println!(
            "batch {} -> {}/{} ok/fail",
            batch_summary.jobs.len(),
            batch_summary.success,
            batch_summary.failure
        );
        for job in batch_summary.jobs.iter().filter(|job| !job.is_ok()) {
            warn!(
                job = %job.job_id,
                "failed: {}",
                job.error.as_deref().unwrap_or("unknown error")
            );
        }
        summary = Some(batch_summary);
        Ok(())
    })();

    let mut params = vec![
        ("plan", plan_path.display().to_string()),
        ("threads", threads.to_string()),
    ];
    let mut inputs = vec![plan_path.to_path_buf()];
    if let Some(workbook) = &workbook_used {
        inputs.push(workbook.clone());
    }
    let mut outputs = Vec::new();
    if let Some(summary) = summary.as_ref() {
        params.push(("num_jobs", summary.jobs.len().to_string()));
        params.push(("success", summary.success.to_string()));
        params.push(("failure", summary.failure.to_string()));
        outputs.extend(summary.outputs.iter().cloned());
        outputs.push(summary.manifest_path.clone());
    }
    record_run_timed(out, "batch", &inputs, &outputs, &params, start, &res);
    res
}
