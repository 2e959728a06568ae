//! Scenario sheet parsing.
//!
//! A scenario sheet is a stack of case-type blocks:
//!
//! ```text
//! row  B                    C                 D       E        F
//!  2   [ ACCA LongTerm  (merged title)                        ]
//!  3   Contingency Events   Resulting Issue   Limit   Value    Percent Loading
//!  4   Line A-B             Xfmr 7 (MVA)      400     412.0    103.0
//!  5   Line C-D                               400     388.0     97.0   <- same issue as row 4
//!  6   (blank row ends the block)
//!  7   [ ACCA ]
//!  ...
//! ```
//!
//! A blank issue cell inherits the last issue seen in the same block; blocks never
//! share state. Blocks that repeat a title are appended in sheet order.

use ctg_core::{
    CaseType, CaseTypeTitles, Diagnostics, LimitValue, ScenarioTable, SheetGrid, ViolationRecord,
};
use serde::Serialize;
use tracing::debug;

use crate::header::{ColumnMap, HeaderDetector, SheetLayout};

/// Scenario sheets are recognized by a block title within this many rows.
pub const SCENARIO_SCAN_ROWS: usize = 250;

#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// 0-based column holding block titles (column B by default).
    pub title_column: usize,
    pub titles: CaseTypeTitles,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            title_column: 1,
            titles: CaseTypeTitles::default(),
        }
    }
}

/// Where one block sat on the sheet and how it was read. Rows are 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub case_type: CaseType,
    pub title_row: usize,
    pub header_row: usize,
    pub records: usize,
    pub layout: SheetLayout,
    pub used_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub table: ScenarioTable,
    pub blocks: Vec<BlockSummary>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioParser {
    options: ParserOptions,
}

impl ScenarioParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn with_titles(titles: CaseTypeTitles) -> Self {
        Self::new(ParserOptions {
            titles,
            ..ParserOptions::default()
        })
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a sheet into a scenario table. A sheet without recognized blocks
    /// yields an empty table.
    pub fn parse(&self, name: &str, grid: &SheetGrid) -> ScenarioTable {
        self.parse_detailed(name, grid).table
    }

    /// True when a known block title appears within the first
    /// [`SCENARIO_SCAN_ROWS`] rows of the title column.
    pub fn is_scenario_sheet(&self, grid: &SheetGrid) -> bool {
        (0..grid.row_count().min(SCENARIO_SCAN_ROWS)).any(|row| self.block_title(grid, row).is_some())
    }

    pub fn parse_detailed(&self, name: &str, grid: &SheetGrid) -> ParsedSheet {
        let mut records = Vec::new();
        let mut blocks = Vec::new();
        let mut diagnostics = Diagnostics::new();

        let mut row = 0;
        while row < grid.row_count() {
            let Some(case_type) = self.block_title(grid, row) else {
                row += 1;
                continue;
            };
            let header_row = row + 1;
            if header_row >= grid.row_count() || self.block_title(grid, header_row).is_some() {
                diagnostics.add_warning_at_row(
                    "header",
                    &format!("{} block has no header row", case_type.display_name()),
                    row + 1,
                );
                row = header_row;
                continue;
            }

            let columns = HeaderDetector::detect(grid.row(header_row));
            if columns.used_fallback() {
                diagnostics.add_warning_at_row(
                    "header",
                    &format!(
                        "{} header incomplete; inferred {:?} from layout positions",
                        case_type.display_name(),
                        columns.inferred
                    ),
                    header_row + 1,
                );
            }

            let before = records.len();
            row = self.read_block(
                grid,
                header_row + 1,
                case_type,
                &columns,
                &mut records,
                &mut diagnostics,
            );
            blocks.push(BlockSummary {
                case_type,
                title_row: header_row,
                header_row: header_row + 1,
                records: records.len() - before,
                layout: columns.layout(),
                used_fallback: columns.used_fallback(),
            });
        }

        debug!(
            sheet = name,
            blocks = blocks.len(),
            records = records.len(),
            "parsed scenario sheet"
        );
        ParsedSheet {
            table: ScenarioTable::new(name, records),
            blocks,
            diagnostics,
        }
    }

    fn block_title(&self, grid: &SheetGrid, row: usize) -> Option<CaseType> {
        let cell = grid.cell(row, self.options.title_column);
        if cell.is_blank() {
            return None;
        }
        self.options.titles.lookup(&cell.as_trimmed_text())
    }

    /// Read data rows starting at `start`; returns the row where scanning resumes.
    fn read_block(
        &self,
        grid: &SheetGrid,
        start: usize,
        case_type: CaseType,
        columns: &ColumnMap,
        records: &mut Vec<ViolationRecord>,
        diagnostics: &mut Diagnostics,
    ) -> usize {
        let mapped = columns.columns();
        let mut last_issue: Option<(String, Option<LimitValue>)> = None;

        let mut row = start;
        while row < grid.row_count() {
            if self.block_title(grid, row).is_some() {
                return row;
            }
            if mapped.iter().all(|&col| grid.cell(row, col).is_blank()) {
                return row + 1;
            }

            let contingency = grid.cell(row, columns.contingency).as_trimmed_text();
            let issue_cell = grid.cell(row, columns.issue);
            let limit = columns
                .limit
                .and_then(|col| LimitValue::from_cell(grid.cell(row, col)));
            let value = columns.value.and_then(|col| grid.cell(row, col).as_number());
            let percent_cell = grid.cell(row, columns.percent);
            let percent = percent_cell.as_number();
            if percent.is_none() && !percent_cell.is_blank() {
                diagnostics.add_warning_at_row(
                    "parse",
                    &format!("percent '{}' is not numeric; treated as missing", percent_cell),
                    row + 1,
                );
            }

            let (issue_id, limit) = if issue_cell.is_blank() {
                match &last_issue {
                    Some((id, issue_limit)) => (id.clone(), limit.or_else(|| issue_limit.clone())),
                    None => {
                        diagnostics.add_error_at_row(
                            "parse",
                            &format!(
                                "{} row has no resulting issue and none above it; row dropped",
                                case_type.display_name()
                            ),
                            row + 1,
                        );
                        row += 1;
                        continue;
                    }
                }
            } else {
                let id = issue_cell.as_trimmed_text();
                last_issue = Some((id.clone(), limit.clone()));
                (id, limit)
            };

            records.push(ViolationRecord {
                case_type,
                contingency,
                issue_id,
                limit,
                value,
                percent,
            });
            row += 1;
        }
        row
    }
}

/// Parse one sheet with the default title column and the given block titles.
pub fn parse_scenario_sheet(name: &str, grid: &SheetGrid, titles: &CaseTypeTitles) -> ScenarioTable {
    ScenarioParser::with_titles(titles.clone()).parse(name, grid)
}
