//! Comparison report layout and output sinks.
//!
//! A report sheet is laid out per case type, in canonical order:
//!
//! ```text
//! ACCA LongTerm                                            <- title row
//! Contingency Events | Resulting Issue | Limit | Base | Future | Δ% (Right - Left) / Status
//! Line A-B           | Xfmr 7          | 400   | 85   | 92.5   | 7.50     <- summary
//! Line G-H           |                 | 400   |      | 90     | Only in right   <- detail
//!                                                           <- separator
//! ```
//!
//! Detail rows leave the issue cell blank. Outline levels and hidden flags are
//! only emitted for sinks whose [`ReportSink::supports_outline`] says so.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use csv::WriterBuilder;
use ctg_algo::{present, present_flat, GroupedRow, PairRecord, RowRole, StraightRecord};
use ctg_core::{format_number, CaseType, CtgError, ScenarioTable};
use serde::{Deserialize, Serialize};

/// Longest sheet name spreadsheet applications accept.
pub const MAX_SHEET_NAME: usize = 31;
pub const DELTA_HEADER: &str = "Δ% (Right - Left) / Status";
pub const NO_ROWS: &str = "No rows";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Title,
    Header,
    Data,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub kind: RowKind,
    pub cells: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub outline_level: u8,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// Set on a summary row that has hidden details below it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsible: bool,
}

fn is_zero(level: &u8) -> bool {
    *level == 0
}

impl ReportRow {
    fn plain(kind: RowKind, cells: Vec<String>) -> Self {
        Self {
            kind,
            cells,
            outline_level: 0,
            hidden: false,
            collapsible: false,
        }
    }

    pub fn title(text: impl Into<String>) -> Self {
        Self::plain(RowKind::Title, vec![text.into()])
    }

    pub fn header(cells: Vec<String>) -> Self {
        Self::plain(RowKind::Header, cells)
    }

    pub fn data(cells: Vec<String>) -> Self {
        Self::plain(RowKind::Data, cells)
    }

    pub fn separator() -> Self {
        Self::plain(RowKind::Separator, Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSheet {
    pub name: String,
    pub rows: Vec<ReportRow>,
}

impl ReportSheet {
    pub fn data_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.kind == RowKind::Data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = CtgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => Err(CtgError::Config(format!(
                "unknown report format '{other}' (expected csv or json)"
            ))),
        }
    }
}

/// How grouped rows are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Group rows by issue with collapsible details; otherwise a flat list.
    pub expandable: bool,
    /// Emit outline levels and hidden flags.
    pub outline: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            expandable: true,
            outline: false,
        }
    }
}

/// `"<left> vs <right>"` made safe for a sheet name: path separators become
/// `-` and the result is cut to [`MAX_SHEET_NAME`] characters.
pub fn pair_sheet_name(left: &str, right: &str) -> String {
    sanitize_sheet_name(&format!("{left} vs {right}"))
}

pub fn sanitize_sheet_name(name: &str) -> String {
    name.replace(['/', '\\'], "-")
        .chars()
        .take(MAX_SHEET_NAME)
        .collect()
}

fn percent_cell(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_default()
}

fn grouped<'a, R: ctg_algo::Groupable>(
    records: &'a [R],
    case_type: CaseType,
    layout: LayoutOptions,
) -> Vec<GroupedRow<'a, R>> {
    if layout.expandable {
        present(records, case_type)
    } else {
        present_flat(records, case_type)
    }
}

fn push_grouped<R, F>(
    rows: &mut Vec<ReportRow>,
    grouped: &[GroupedRow<'_, R>],
    layout: LayoutOptions,
    cells: F,
) where
    F: Fn(&R, bool) -> Vec<String>,
{
    for row in grouped {
        let detail = row.role == RowRole::Detail;
        let mut report_row = ReportRow::data(cells(row.record, detail));
        if layout.outline {
            report_row.outline_level = row.collapse_level;
            report_row.hidden = !row.visible;
            report_row.collapsible = row.collapsible;
        }
        rows.push(report_row);
    }
}

/// Left-vs-right report over every case type present in `records`.
pub fn render_pair_report(
    left: &str,
    right: &str,
    records: &[PairRecord],
    layout: LayoutOptions,
) -> ReportSheet {
    let header = || {
        ReportRow::header(vec![
            "Contingency Events".to_string(),
            "Resulting Issue".to_string(),
            "Limit".to_string(),
            left.to_string(),
            right.to_string(),
            DELTA_HEADER.to_string(),
        ])
    };
    let name = pair_sheet_name(left, right);

    if records.is_empty() {
        return ReportSheet {
            name,
            rows: vec![
                ReportRow::title(format!("{left} vs {right}")),
                header(),
                ReportRow::data(vec![NO_ROWS.to_string()]),
            ],
        };
    }

    let mut rows = Vec::new();
    for case_type in CaseType::ALL {
        let group = grouped(records, case_type, layout);
        if group.is_empty() {
            continue;
        }
        rows.push(ReportRow::title(case_type.display_name()));
        rows.push(header());
        push_grouped(&mut rows, &group, layout, |record: &PairRecord, detail| {
            vec![
                record.contingency.clone(),
                if detail { String::new() } else { record.issue_id.clone() },
                record.limit.clone(),
                percent_cell(record.left_percent),
                percent_cell(record.right_percent),
                record.delta_display.clone(),
            ]
        });
        rows.push(ReportRow::separator());
    }
    ReportSheet { name, rows }
}

/// N-way report with one percent column per scenario, in `scenarios` order.
pub fn render_straight_report(
    title: &str,
    scenarios: &[String],
    records: &[StraightRecord],
    layout: LayoutOptions,
) -> ReportSheet {
    let header = || {
        let mut cells = vec![
            "Contingency Events".to_string(),
            "Resulting Issue".to_string(),
            "Limit".to_string(),
        ];
        cells.extend(scenarios.iter().cloned());
        ReportRow::header(cells)
    };

    let mut rows = Vec::new();
    if records.is_empty() {
        rows.push(ReportRow::title(title));
        rows.push(header());
        rows.push(ReportRow::data(vec![NO_ROWS.to_string()]));
    }
    for case_type in CaseType::ALL {
        let group = grouped(records, case_type, layout);
        if group.is_empty() {
            continue;
        }
        rows.push(ReportRow::title(case_type.display_name()));
        rows.push(header());
        push_grouped(&mut rows, &group, layout, |record: &StraightRecord, detail| {
            let mut cells = vec![
                record.contingency.clone(),
                if detail { String::new() } else { record.issue_id.clone() },
                record.limit_display(),
            ];
            cells.extend(scenarios.iter().map(|s| percent_cell(record.percent_for(s))));
            cells
        });
        rows.push(ReportRow::separator());
    }
    ReportSheet {
        name: sanitize_sheet_name(title),
        rows,
    }
}

/// Parsed records of one scenario as a flat sheet.
pub fn render_scenario_table(table: &ScenarioTable) -> ReportSheet {
    let mut rows = vec![ReportRow::header(
        ["Case Type", "Contingency Events", "Resulting Issue", "Limit", "Value", "Percent Loading"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    )];
    rows.extend(table.records().iter().map(|r| {
        ReportRow::data(vec![
            r.case_type.canonical().to_string(),
            r.contingency.clone(),
            r.issue_id.clone(),
            r.limit.as_ref().map(ToString::to_string).unwrap_or_default(),
            percent_cell(r.value),
            percent_cell(r.percent),
        ])
    }));
    ReportSheet {
        name: sanitize_sheet_name(table.name()),
        rows,
    }
}

/// Destination for rendered report sheets.
pub trait ReportSink {
    /// Whether outline levels and hidden rows survive in this format.
    fn supports_outline(&self) -> bool;

    fn write_sheet(&mut self, sheet: &ReportSheet) -> Result<()>;

    /// Flush everything and return the files written.
    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>>;
}

/// CSV output: either every sheet appended to one file, or one file per sheet
/// in a directory.
pub struct CsvSink {
    target: CsvTarget,
    written: Vec<PathBuf>,
}

enum CsvTarget {
    File {
        path: PathBuf,
        writer: csv::Writer<BufWriter<File>>,
        sheets: usize,
    },
    Directory(PathBuf),
}

impl CsvSink {
    pub fn file(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let writer = WriterBuilder::new()
            .flexible(true)
            .from_writer(BufWriter::new(file));
        Ok(Self {
            target: CsvTarget::File {
                path: path.to_path_buf(),
                writer,
                sheets: 0,
            },
            written: Vec::new(),
        })
    }

    pub fn directory(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        Ok(Self {
            target: CsvTarget::Directory(dir.to_path_buf()),
            written: Vec::new(),
        })
    }
}

fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, sheet: &ReportSheet) -> Result<()> {
    for row in &sheet.rows {
        if row.cells.is_empty() {
            writer.write_record([""])?;
        } else {
            writer.write_record(&row.cells)?;
        }
    }
    Ok(())
}

impl ReportSink for CsvSink {
    fn supports_outline(&self) -> bool {
        false
    }

    fn write_sheet(&mut self, sheet: &ReportSheet) -> Result<()> {
        match &mut self.target {
            CsvTarget::File { writer, sheets, .. } => {
                if *sheets > 0 {
                    writer.write_record([""])?;
                }
                write_rows(writer, sheet)?;
                *sheets += 1;
            }
            CsvTarget::Directory(dir) => {
                let path = dir.join(format!("{}.csv", sheet.name));
                let mut writer = WriterBuilder::new()
                    .flexible(true)
                    .from_path(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                write_rows(&mut writer, sheet)?;
                writer.flush()?;
                self.written.push(path);
            }
        }
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>> {
        let mut written = self.written;
        if let CsvTarget::File {
            path, mut writer, ..
        } = self.target
        {
            writer
                .flush()
                .with_context(|| format!("writing {}", path.display()))?;
            written.push(path);
        }
        Ok(written)
    }
}

/// JSON output: all sheets in one document, outline state included.
pub struct JsonSink {
    path: PathBuf,
    sheets: Vec<ReportSheet>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    sheets: &'a [ReportSheet],
}

impl JsonSink {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            sheets: Vec::new(),
        }
    }
}

impl ReportSink for JsonSink {
    fn supports_outline(&self) -> bool {
        true
    }

    fn write_sheet(&mut self, sheet: &ReportSheet) -> Result<()> {
        self.sheets.push(sheet.clone());
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<PathBuf>> {
        let file = File::create(&self.path)
            .with_context(|| format!("creating {}", self.path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(
            &mut writer,
            &JsonReport {
                sheets: &self.sheets,
            },
        )
        .with_context(|| format!("writing {}", self.path.display()))?;
        writer.flush()?;
        Ok(vec![self.path])
    }
}

/// Sink writing to a single file in the given format.
pub fn open_sink(format: ReportFormat, path: &Path) -> Result<Box<dyn ReportSink>> {
    Ok(match format {
        ReportFormat::Csv => Box::new(CsvSink::file(path)?),
        ReportFormat::Json => Box::new(JsonSink::new(path)),
    })
}

/// Sink for many sheets under a directory: one CSV per sheet, or one
/// `<stem>.json` document.
pub fn open_directory_sink(
    format: ReportFormat,
    dir: &Path,
    stem: &str,
) -> Result<Box<dyn ReportSink>> {
    Ok(match format {
        ReportFormat::Csv => Box::new(CsvSink::directory(dir)?),
        ReportFormat::Json => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            Box::new(JsonSink::new(&dir.join(format!("{stem}.json"))))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctg_core::ViolationRecord;

    fn pair_records() -> Vec<PairRecord> {
        let left = ScenarioTable::new(
            "Base",
            vec![
                ViolationRecord::new(CaseType::Acca, "Line A-B", "Xfmr 7", Some(85.0)),
                ViolationRecord::new(CaseType::Acca, "Line C-D", "Xfmr 7", Some(82.0)),
            ],
        );
        let right = ScenarioTable::new(
            "Future",
            vec![ViolationRecord::new(CaseType::Acca, "Line A-B", "Xfmr 7", Some(92.5))],
        );
        ctg_algo::compare_pair(&left, &right, 80.0)
    }

    #[test]
    fn sheet_names_are_sanitized() {
        assert_eq!(pair_sheet_name("2025/Summer", "2030\\Peak"), "2025-Summer vs 2030-Peak");
        let long = pair_sheet_name("A very long scenario name", "another long one");
        assert_eq!(long.chars().count(), MAX_SHEET_NAME);
    }

    #[test]
    fn pair_layout_blanks_issue_on_detail_rows() {
        let records = pair_records();
        let sheet = render_pair_report("Base", "Future", &records, LayoutOptions::default());
        let kinds: Vec<_> = sheet.rows.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowKind::Title,
                RowKind::Header,
                RowKind::Data,
                RowKind::Data,
                RowKind::Separator
            ]
        );
        assert_eq!(sheet.rows[0].cells, vec!["ACCA"]);
        assert_eq!(sheet.rows[1].cells[5], DELTA_HEADER);
        assert_eq!(
            sheet.rows[2].cells,
            vec!["Line A-B", "Xfmr 7", "", "85", "92.5", "7.50"]
        );
        assert_eq!(sheet.rows[3].cells[1], "");
        // no outline without a sink that supports it
        assert!(!sheet.rows[3].hidden);
    }

    #[test]
    fn outline_state_only_when_requested() {
        let records = pair_records();
        let layout = LayoutOptions {
            expandable: true,
            outline: true,
        };
        let sheet = render_pair_report("Base", "Future", &records, layout);
        assert!(sheet.rows[2].collapsible);
        assert_eq!(sheet.rows[3].outline_level, 1);
        assert!(sheet.rows[3].hidden);
    }

    #[test]
    fn empty_pair_report_says_so() {
        let sheet = render_pair_report("Base", "Future", &[], LayoutOptions::default());
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].cells, vec!["Base vs Future"]);
        assert_eq!(sheet.rows[2].cells, vec![NO_ROWS]);
    }

    #[test]
    fn straight_layout_has_column_per_scenario() {
        let a = ScenarioTable::new(
            "A",
            vec![ViolationRecord::new(CaseType::DcWac, "C1", "I1", Some(60.0))],
        );
        let c = ScenarioTable::new(
            "C",
            vec![ViolationRecord::new(CaseType::DcWac, "C1", "I1", Some(81.0))],
        );
        let b = ScenarioTable::empty("B");
        let records = ctg_algo::compare_all(&[("A", &a), ("B", &b), ("C", &c)], CaseType::DcWac, 80.0);
        let scenarios = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let sheet = render_straight_report("Straight", &scenarios, &records, LayoutOptions::default());
        assert_eq!(sheet.rows[0].cells, vec!["DCwAC"]);
        assert_eq!(sheet.rows[1].cells.len(), 6);
        assert_eq!(sheet.rows[2].cells, vec!["C1", "I1", "", "60", "", "81"]);
    }

    #[test]
    fn csv_sink_appends_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut sink = open_sink(ReportFormat::Csv, &path).unwrap();
        assert!(!sink.supports_outline());
        let sheet = render_pair_report("Base", "Future", &[], LayoutOptions::default());
        sink.write_sheet(&sheet).unwrap();
        sink.write_sheet(&sheet).unwrap();
        let written = sink.finish().unwrap();
        assert_eq!(written, vec![path.clone()]);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches(NO_ROWS).count(), 2);
    }

    #[test]
    fn json_sink_keeps_outline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut sink = open_sink(ReportFormat::Json, &path).unwrap();
        assert!(sink.supports_outline());
        let layout = LayoutOptions {
            expandable: true,
            outline: sink.supports_outline(),
        };
        sink.write_sheet(&render_pair_report("Base", "Future", &pair_records(), layout))
            .unwrap();
        sink.finish().unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["sheets"][0]["rows"][3]["hidden"], true);
        assert_eq!(json["sheets"][0]["rows"][3]["outline_level"], 1);
    }

    #[test]
    fn format_parses() {
        assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xlsx".parse::<ReportFormat>().is_err());
    }
}
