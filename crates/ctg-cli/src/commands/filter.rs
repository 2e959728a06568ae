use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use ctg_algo::{FilterConfig, RowFilterPipeline, StageOutcome};
use ctg_io::{filtered_path, read_raw_export, write_raw_table};
use tracing::info;

use crate::commands::telemetry::{manifest_dir, record_run_timed};

pub fn handle(input: &Path, out: Option<&Path>, config: FilterConfig) -> Result<()> {
    let start = Instant::now();
    let out = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| filtered_path(input));
    let params = vec![
        (
            "categories",
            config
                .keep_categories
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
        ),
        ("dedup", config.dedup_by_issue.to_string()),
    ];

    let res = (|| -> Result<()> {
        let raw = read_raw_export(input)?;
        let (filtered, report) = RowFilterPipeline::new(config).apply(&raw);
        write_raw_table(&out, &filtered)?;
        info!(out = %out.display(), "filtered export written");
        println!(
            "{} -> {} rows ({} by category, {} by issue dedup, {} columns dropped)",
            report.input_rows,
            report.output_rows,
            removed(report.category, report.rows_removed_by_category),
            removed(report.dedup, report.rows_removed_by_dedup),
            report.columns_removed.len()
        );
        Ok(())
    })();

    let outputs = if res.is_ok() { vec![out.clone()] } else { Vec::new() };
    record_run_timed(
        &manifest_dir(&out),
        "filter",
        &[input.to_path_buf()],
        &outputs,
        &params,
        start,
        &res,
    );
    res
}

fn removed(outcome: StageOutcome, rows: usize) -> String {
    match outcome {
        StageOutcome::Applied => format!("-{rows}"),
        StageOutcome::KeepAll => "kept all".to_string(),
        StageOutcome::Disabled => "off".to_string(),
        StageOutcome::MissingColumn => "column missing".to_string(),
    }
}
