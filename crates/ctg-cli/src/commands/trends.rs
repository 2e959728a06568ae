use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ctg_algo::{build_trends, ScenarioParser};
use ctg_core::{format_number, CaseType};
use ctg_io::{load_scenarios, open_workbook};
use tabwriter::TabWriter;

pub fn handle(
    workbook: &Path,
    case_type: CaseType,
    min_percent: f64,
    sheets: &[String],
    json: bool,
    parser: &ScenarioParser,
) -> Result<()> {
    let mut source = open_workbook(workbook)?;
    let tables = load_scenarios(source.as_mut(), parser, sheets)?;
    if tables.is_empty() {
        return Err(anyhow!("no scenario sheets found in '{}'", workbook.display()));
    }
    let refs: Vec<_> = tables.iter().collect();
    let report = build_trends(&refs, case_type, min_percent);

    if json {
        serde_json::to_writer_pretty(io::stdout(), &report)
            .context("serializing trends to JSON")?;
        println!();
        return Ok(());
    }

    let mut writer = TabWriter::new(io::stdout());
    write!(writer, "ISSUE")?;
    for sheet in &report.sheets {
        write!(writer, "\t{sheet}")?;
    }
    writeln!(writer, "\tPEAK")?;
    for issue in &report.issues {
        write!(writer, "{}", issue.issue_display)?;
        for peak in &issue.per_sheet {
            write!(
                writer,
                "\t{}",
                peak.percent.map(format_number).unwrap_or_else(|| "-".to_string())
            )?;
        }
        writeln!(
            writer,
            "\t{}",
            issue.max_percent().map(format_number).unwrap_or_default()
        )?;
    }
    writer.flush()?;
    Ok(())
}
