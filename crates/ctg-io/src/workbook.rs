//! Sheet sources: spreadsheet workbooks read with calamine, or a directory of
//! CSV files standing in for one (one sheet per file, named by file stem).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use ctg_algo::ScenarioParser;
use ctg_core::{Cell, ScenarioTable, SheetGrid};
use thiserror::Error;
use tracing::debug;

pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("sheet '{name}' not found (available: {})", .available.join(", "))]
    SheetNotFound { name: String, available: Vec<String> },

    #[error("unsupported workbook '{0}': expected a directory of CSV files or one of .xlsx, .xlsm, .xlsb, .xls, .ods")]
    Unsupported(PathBuf),
}

/// Anything that can hand out sheets as materialized cell grids.
pub trait SheetSource {
    /// Sheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    fn read_sheet(&mut self, name: &str) -> Result<SheetGrid>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|s| s == name)
    }
}

/// Open a workbook file or CSV directory.
pub fn open_workbook(path: &Path) -> Result<Box<dyn SheetSource>> {
    if path.is_dir() {
        return Ok(Box::new(CsvDirSource::open(path)?));
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        Ok(Box::new(XlsxSource::open(path)?))
    } else {
        Err(WorkbookError::Unsupported(path.to_path_buf()).into())
    }
}

pub struct XlsxSource {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl XlsxSource {
    pub fn open(path: &Path) -> Result<Self> {
        let workbook =
            open_workbook_auto(path).with_context(|| format!("open workbook {:?}", path))?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }
}

impl SheetSource for XlsxSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_owned()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetGrid> {
        if !self.has_sheet(name) {
            return Err(WorkbookError::SheetNotFound {
                name: name.to_string(),
                available: self.sheet_names(),
            }
            .into());
        }
        let range = self
            .workbook
            .worksheet_range(name)
            .with_context(|| format!("read worksheet {name} from {:?}", self.path))?;
        Ok(grid_from_range(&range))
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        other => Cell::Text(other.to_string()),
    }
}

/// Place a calamine range at its absolute sheet position.
fn grid_from_range(range: &Range<Data>) -> SheetGrid {
    let Some((row_offset, col_offset)) = range.start() else {
        return SheetGrid::default();
    };
    let (row_offset, col_offset) = (row_offset as usize, col_offset as usize);
    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for row in range.rows() {
        let mut cells = vec![Cell::Empty; col_offset];
        cells.extend(row.iter().map(cell_from_data));
        rows.push(cells);
    }
    SheetGrid::new(rows)
}

/// A directory of `.csv` files; sheet order is file name order.
pub struct CsvDirSource {
    sheets: Vec<(String, PathBuf)>,
}

impl CsvDirSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut sheets = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(|| format!("list directory {:?}", dir))? {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                sheets.push((stem.to_string(), path.clone()));
            }
        }
        sheets.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { sheets })
    }
}

impl SheetSource for CsvDirSource {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, name: &str) -> Result<SheetGrid> {
        let path = self
            .sheets
            .iter()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, path)| path.clone())
            .ok_or_else(|| WorkbookError::SheetNotFound {
                name: name.to_string(),
                available: self.sheet_names(),
            })?;
        let rows = crate::export::read_csv_rows(&path)?;
        Ok(SheetGrid::from_text_rows(rows))
    }
}

/// Names of sheets that hold at least one recognized case-type block near the top.
pub fn scenario_sheet_names(
    source: &mut dyn SheetSource,
    parser: &ScenarioParser,
) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for name in source.sheet_names() {
        let grid = source.read_sheet(&name)?;
        if parser.is_scenario_sheet(&grid) {
            found.push(name);
        }
    }
    debug!(sheets = found.len(), "scenario sheets discovered");
    Ok(found)
}

/// Parse the named sheets; an empty `names` list means every scenario sheet.
pub fn load_scenarios(
    source: &mut dyn SheetSource,
    parser: &ScenarioParser,
    names: &[String],
) -> Result<Vec<ScenarioTable>> {
    let names = if names.is_empty() {
        scenario_sheet_names(source, parser)?
    } else {
        names.to_vec()
    };
    names
        .iter()
        .map(|name| {
            let grid = source.read_sheet(name)?;
            Ok(parser.parse(name, &grid))
        })
        .collect()
}
