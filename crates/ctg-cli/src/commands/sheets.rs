use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use ctg_algo::ScenarioParser;
use ctg_io::{open_workbook, scenario_sheet_names};
use tabwriter::TabWriter;

pub fn handle(workbook: &Path, all: bool, parser: &ScenarioParser) -> Result<()> {
    let mut source = open_workbook(workbook)?;
    let names = if all {
        source.sheet_names()
    } else {
        scenario_sheet_names(source.as_mut(), parser)?
    };

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SHEET\tCASE TYPES\tRECORDS")?;
    for name in &names {
        let grid = source.read_sheet(name)?;
        let table = parser.parse(name, &grid);
        let case_types = table
            .case_types()
            .iter()
            .map(|ct| ct.display_name())
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(writer, "{}\t{}\t{}", name, case_types, table.len())?;
    }
    writer.flush()?;
    Ok(())
}
