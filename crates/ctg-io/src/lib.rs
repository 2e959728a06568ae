//! # ctg-io: workbook, export and report I/O
//!
//! - [`workbook`]: sheet sources (spreadsheets via calamine, CSV directories)
//! - [`export`]: raw violation export CSVs and their file naming
//! - [`report`]: comparison report layout and CSV / JSON sinks

pub mod export;
pub mod report;
pub mod workbook;

pub use export::{
    export_path_for_case, filtered_path, read_csv_rows, read_raw_export, write_raw_table,
};
pub use report::{
    open_directory_sink, open_sink, pair_sheet_name, render_pair_report, render_scenario_table,
    render_straight_report, sanitize_sheet_name, CsvSink, JsonSink, LayoutOptions, ReportFormat,
    ReportRow, ReportSheet, ReportSink, RowKind, DELTA_HEADER, MAX_SHEET_NAME, NO_ROWS,
};
pub use workbook::{
    load_scenarios, open_workbook, scenario_sheet_names, CsvDirSource, SheetSource,
    WorkbookError, XlsxSource,
};
