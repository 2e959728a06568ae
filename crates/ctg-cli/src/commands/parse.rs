use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use ctg_algo::ScenarioParser;
use ctg_io::{open_workbook, render_scenario_table, ReportFormat};
use tracing::{info, warn};

use crate::commands::output::ReportOutput;
use crate::commands::telemetry::{manifest_dir, record_run_timed};

pub fn handle(
    workbook: &Path,
    sheet: &str,
    out: Option<&Path>,
    format: ReportFormat,
    diagnostics: bool,
    parser: &ScenarioParser,
) -> Result<()> {
    let start = Instant::now();
    let res = (|| -> Result<Vec<std::path::PathBuf>> {
        let mut source = open_workbook(workbook)?;
        let grid = source.read_sheet(sheet)?;
        let parsed = parser.parse_detailed(sheet, &grid);
        info!(
            sheet,
            blocks = parsed.blocks.len(),
            records = parsed.table.len(),
            "sheet parsed"
        );
        if parsed.diagnostics.has_issues() {
            warn!(sheet, "parse diagnostics: {}", parsed.diagnostics.summary());
        }
        if diagnostics {
            for block in &parsed.blocks {
                eprintln!(
                    "block {} at row {} (header row {}): {} records{}",
                    block.case_type.display_name(),
                    block.title_row,
                    block.header_row,
                    block.records,
                    if block.used_fallback { ", fallback layout" } else { "" }
                );
            }
            for issue in &parsed.diagnostics.issues {
                let row = issue.row.map(|r| format!(" row {r}")).unwrap_or_default();
                eprintln!(
                    "{:?} [{}]{}: {}",
                    issue.severity, issue.category, row, issue.message
                );
            }
        }

        let mut output = ReportOutput::open(out, format)?;
        output.write_sheet(render_scenario_table(&parsed.table))?;
        output.finish()
    })();

    if let Some(out) = out {
        let outputs = res.as_ref().cloned().unwrap_or_default();
        record_run_timed(
            &manifest_dir(out),
            "parse",
            &[workbook.to_path_buf()],
            &outputs,
            &[("sheet", sheet.to_string()), ("format", format.extension().to_string())],
            start,
            &res,
        );
    }
    res.map(|_| ())
}
