use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use ctg_algo::{ComparisonEngine, ScenarioParser};
use ctg_core::{CaseType, ScenarioTable};
use ctg_io::{
    load_scenarios, open_workbook, render_pair_report, render_straight_report, LayoutOptions,
    ReportFormat,
};
use tracing::info;

use crate::commands::output::ReportOutput;
use crate::commands::telemetry::{manifest_dir, record_run_timed};
use crate::commands::util::check_threshold;

/// Settings shared by `compare` and `straight`.
pub struct CompareArgs<'a> {
    pub workbook: &'a Path,
    pub threshold: f64,
    pub case_type: Option<CaseType>,
    pub expandable: bool,
    pub out: Option<&'a Path>,
    pub format: ReportFormat,
}

impl CompareArgs<'_> {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("threshold", self.threshold.to_string()),
            (
                "case_type",
                self.case_type.map(|ct| ct.to_string()).unwrap_or_default(),
            ),
            ("expandable", self.expandable.to_string()),
            ("format", self.format.extension().to_string()),
        ]
    }
}

fn record(
    args: &CompareArgs<'_>,
    command: &str,
    params: &[(&str, String)],
    start: Instant,
    res: &Result<Vec<PathBuf>>,
) {
    if let Some(out) = args.out {
        let outputs = res.as_ref().cloned().unwrap_or_default();
        record_run_timed(
            &manifest_dir(out),
            command,
            &[args.workbook.to_path_buf()],
            &outputs,
            params,
            start,
            res,
        );
    }
}

pub fn handle_pair(
    args: &CompareArgs<'_>,
    left: &str,
    right: &str,
    parser: &ScenarioParser,
) -> Result<()> {
    let start = Instant::now();
    let res = (|| -> Result<Vec<PathBuf>> {
        let engine = ComparisonEngine::new(check_threshold(args.threshold)?);
        let mut source = open_workbook(args.workbook)?;
        let tables = load_scenarios(
            source.as_mut(),
            parser,
            &[left.to_string(), right.to_string()],
        )?;
        let (l, r) = (&tables[0], &tables[1]);
        let records = match args.case_type {
            Some(case_type) => engine.compare(l, r, case_type),
            None => engine.compare_pair(l, r),
        };
        info!(left, right, records = records.len(), "pair comparison done");

        let mut output = ReportOutput::open(args.out, args.format)?;
        let layout = LayoutOptions {
            expandable: args.expandable,
            outline: output.supports_outline(),
        };
        output.write_sheet(render_pair_report(left, right, &records, layout))?;
        output.finish()
    })();

    let mut params = args.params();
    params.push(("left", left.to_string()));
    params.push(("right", right.to_string()));
    record(args, "compare", &params, start, &res);
    res.map(|_| ())
}

pub fn handle_straight(
    args: &CompareArgs<'_>,
    sheets: &[String],
    title: &str,
    parser: &ScenarioParser,
) -> Result<()> {
    let start = Instant::now();
    let mut used_sheets = Vec::new();
    let res = (|| -> Result<Vec<PathBuf>> {
        let engine = ComparisonEngine::new(check_threshold(args.threshold)?);
        let mut source = open_workbook(args.workbook)?;
        let tables: Vec<ScenarioTable> = load_scenarios(source.as_mut(), parser, sheets)?;
        if tables.is_empty() {
            return Err(anyhow!(
                "no scenario sheets found in '{}'",
                args.workbook.display()
            ));
        }
        used_sheets = tables.iter().map(|t| t.name().to_string()).collect();
        let scenarios: Vec<(&str, &ScenarioTable)> =
            tables.iter().map(|t| (t.name(), t)).collect();
        let records = match args.case_type {
            Some(case_type) => engine.compare_all(&scenarios, case_type),
            None => engine.compare_all_case_types(&scenarios),
        };
        info!(
            sheets = scenarios.len(),
            records = records.len(),
            "straight comparison done"
        );

        let mut output = ReportOutput::open(args.out, args.format)?;
        let layout = LayoutOptions {
            expandable: args.expandable,
            outline: output.supports_outline(),
        };
        output.write_sheet(render_straight_report(title, &used_sheets, &records, layout))?;
        output.finish()
    })();

    let mut params = args.params();
    params.push(("sheets", used_sheets.join(",")));
    params.push(("title", title.to_string()));
    record(args, "straight", &params, start, &res);
    res.map(|_| ())
}
