//! Row filtering for freshly exported violation tables.
//!
//! Exports carry one descriptive leading row, a header row, then data. The
//! pipeline runs three stages in a fixed order: category allow-list,
//! optional keep-max-per-issue dedup, column blacklist. Surviving rows keep
//! their relative input order.

use std::collections::{BTreeSet, HashMap, HashSet};

use ctg_core::{parse_number, CaseType, Cell, LimitValue, ScenarioTable, ViolationRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::header::HeaderDetector;

pub const DEFAULT_CATEGORY_COLUMN: &str = "LimViolCat";
pub const DEFAULT_ISSUE_COLUMN: &str = "LimViolID";
pub const DEFAULT_PERCENT_COLUMN: &str = "LimViolPct";
pub const DEFAULT_KEEP_CATEGORY: &str = "Branch MVA";

/// Base names of location columns dropped from every export.
pub const DEFAULT_BLACKLIST_BASE_NAMES: [&str; 6] = [
    "BusNum",
    "BusName",
    "BusNomVolt",
    "AreaNum",
    "AreaName",
    "ZoneNum",
];

/// A raw exported table: header names plus string rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Build from all rows of an export file: the first row is descriptive and
    /// skipped, the second is the header. Returns `None` when there is no header.
    pub fn from_export_rows(mut rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.len() < 2 {
            return None;
        }
        let data = rows.split_off(2);
        let headers = rows.pop()?.into_iter().map(|h| h.trim().to_string()).collect();
        Some(Self::new(headers, data))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Distinct non-blank values of a column, sorted; used to offer category choices.
    pub fn distinct_values(&self, name: &str) -> Vec<String> {
        let Some(col) = self.column_index(name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Convert to a scenario table using the header detector on the header names.
    pub fn to_scenario_table(&self, name: &str, case_type: CaseType) -> ScenarioTable {
        let header: Vec<Cell> = self.headers.iter().map(|h| Cell::from(h.as_str())).collect();
        let columns = HeaderDetector::detect(&header);
        let records = (0..self.rows.len())
            .filter_map(|row| {
                let issue = self.value(row, columns.issue).trim();
                if issue.is_empty() {
                    return None;
                }
                Some(ViolationRecord {
                    case_type,
                    contingency: self.value(row, columns.contingency).trim().to_string(),
                    issue_id: issue.to_string(),
                    limit: columns
                        .limit
                        .and_then(|col| LimitValue::from_text(self.value(row, col))),
                    value: columns.value.and_then(|col| parse_number(self.value(row, col))),
                    percent: parse_number(self.value(row, columns.percent)),
                })
            })
            .collect();
        ScenarioTable::new(name, records)
    }
}

/// Columns removed unconditionally. A header matches when its part before the
/// first `:` is a base name, or when the whole header is an exact name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnBlacklist {
    pub base_names: BTreeSet<String>,
    pub exact_names: BTreeSet<String>,
}

impl Default for ColumnBlacklist {
    fn default() -> Self {
        Self {
            base_names: DEFAULT_BLACKLIST_BASE_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exact_names: BTreeSet::new(),
        }
    }
}

impl ColumnBlacklist {
    pub fn none() -> Self {
        Self {
            base_names: BTreeSet::new(),
            exact_names: BTreeSet::new(),
        }
    }

    pub fn is_blacklisted(&self, column: &str) -> bool {
        let base = column.split(':').next().unwrap_or(column);
        self.base_names.contains(base) || self.exact_names.contains(column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub category_column: String,
    /// Empty means keep every category.
    pub keep_categories: BTreeSet<String>,
    pub dedup_by_issue: bool,
    pub issue_column: String,
    pub percent_column: String,
    pub blacklist: ColumnBlacklist,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            category_column: DEFAULT_CATEGORY_COLUMN.to_string(),
            keep_categories: BTreeSet::from([DEFAULT_KEEP_CATEGORY.to_string()]),
            dedup_by_issue: false,
            issue_column: DEFAULT_ISSUE_COLUMN.to_string(),
            percent_column: DEFAULT_PERCENT_COLUMN.to_string(),
            blacklist: ColumnBlacklist::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Applied,
    /// Allow-set empty: every row kept.
    KeepAll,
    Disabled,
    MissingColumn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub input_rows: usize,
    pub category: StageOutcome,
    pub rows_removed_by_category: usize,
    pub dedup: StageOutcome,
    pub rows_removed_by_dedup: usize,
    pub columns_removed: Vec<String>,
    pub output_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RowFilterPipeline {
    config: FilterConfig,
}

impl RowFilterPipeline {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn apply(&self, table: &RawTable) -> (RawTable, FilterReport) {
        let input_rows = table.row_count();
        let mut rows: Vec<&Vec<String>> = table.rows.iter().collect();

        let category = self.category_stage(table, &mut rows);
        let after_category = rows.len();
        let dedup = self.dedup_stage(table, &mut rows);
        let after_dedup = rows.len();

        let keep: Vec<usize> = table
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !self.config.blacklist.is_blacklisted(h))
            .map(|(i, _)| i)
            .collect();
        let columns_removed: Vec<String> = table
            .headers
            .iter()
            .filter(|h| self.config.blacklist.is_blacklisted(h))
            .cloned()
            .collect();

        let headers = keep.iter().map(|&i| table.headers[i].clone()).collect();
        let rows = rows
            .into_iter()
            .map(|row| {
                keep.iter()
                    .map(|&i| row.get(i).cloned().unwrap_or_default())
                    .collect()
            })
            .collect::<Vec<Vec<String>>>();

        let report = FilterReport {
            input_rows,
            category,
            rows_removed_by_category: input_rows - after_category,
            dedup,
            rows_removed_by_dedup: after_category - after_dedup,
            columns_removed,
            output_rows: rows.len(),
        };
        info!(
            input = report.input_rows,
            category_removed = report.rows_removed_by_category,
            dedup_removed = report.rows_removed_by_dedup,
            columns_removed = report.columns_removed.len(),
            output = report.output_rows,
            "row filter complete"
        );
        (RawTable::new(headers, rows), report)
    }

    fn category_stage(&self, table: &RawTable, rows: &mut Vec<&Vec<String>>) -> StageOutcome {
        let Some(col) = table.column_index(&self.config.category_column) else {
            warn!(
                column = %self.config.category_column,
                "category column not found; row filter skipped"
            );
            return StageOutcome::MissingColumn;
        };
        if self.config.keep_categories.is_empty() {
            info!("no categories selected; keeping all rows");
            return StageOutcome::KeepAll;
        }
        rows.retain(|row| {
            row.get(col)
                .map(|v| self.config.keep_categories.contains(v.trim()))
                .unwrap_or(false)
        });
        StageOutcome::Applied
    }

    fn dedup_stage(&self, table: &RawTable, rows: &mut Vec<&Vec<String>>) -> StageOutcome {
        if !self.config.dedup_by_issue {
            return StageOutcome::Disabled;
        }
        let Some(id_col) = table.column_index(&self.config.issue_column) else {
            warn!(
                column = %self.config.issue_column,
                "issue column not found; dedup skipped"
            );
            return StageOutcome::MissingColumn;
        };
        let pct_col = table.column_index(&self.config.percent_column);
        if pct_col.is_none() {
            warn!(
                column = %self.config.percent_column,
                "percent column not found; first row per issue kept"
            );
        }

        let percent_of = |row: &Vec<String>| {
            pct_col
                .and_then(|col| row.get(col))
                .and_then(|v| parse_number(v))
        };

        // winner index per issue id; blank ids are their own group
        let mut best: HashMap<&str, usize> = HashMap::new();
        for (idx, &row) in rows.iter().enumerate() {
            let id = row.get(id_col).map(|v| v.trim()).unwrap_or("");
            if id.is_empty() {
                continue;
            }
            match best.get(id) {
                Some(&current) if !beats(percent_of(row), percent_of(rows[current])) => {}
                _ => {
                    best.insert(id, idx);
                }
            }
        }
        let winners: HashSet<usize> = best.into_values().collect();
        let mut idx = 0;
        rows.retain(|row| {
            let keep = winners.contains(&idx)
                || row.get(id_col).map(|v| v.trim().is_empty()).unwrap_or(true);
            idx += 1;
            keep
        });
        StageOutcome::Applied
    }
}

/// Strictly greater wins; ties keep the earlier row. Missing percents lose.
fn beats(candidate: Option<f64>, current: Option<f64>) -> bool {
    match (candidate, current) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        _ => false,
    }
}
