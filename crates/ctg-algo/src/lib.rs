//! # ctg-algo: parsing and comparison of contingency violation reports
//!
//! The processing chain, leaves first:
//!
//! | stage | entry point | input → output |
//! |-------|-------------|----------------|
//! | header detection | [`HeaderDetector::detect`] | header row → [`ColumnMap`] |
//! | sheet parsing | [`ScenarioParser::parse`] | cell grid → [`ScenarioTable`](ctg_core::ScenarioTable) |
//! | export filtering | [`RowFilterPipeline::apply`] | raw export → filtered export |
//! | comparison | [`compare`], [`compare_pair`], [`compare_all`] | scenario tables → records |
//! | grouping | [`present`], [`present_flat`] | records → outline rows |
//!
//! Every stage is a pure function of its inputs. Data problems never raise:
//! unreadable numbers become missing values, unknown case types and missing
//! tables produce empty output.
//!
//! ## Example
//!
//! ```
//! use ctg_algo::{compare, present, ScenarioParser};
//! use ctg_core::{CaseType, SheetGrid};
//!
//! let sheet = |pct: &str| {
//!     SheetGrid::from_text_rows(vec![
//!         vec!["", "ACCA"],
//!         vec!["", "Contingency Events", "Resulting Issue", "Contingency Value (MVA)", "Percent Loading"],
//!         vec!["", "Line A-B", "I1", "410", pct],
//!     ])
//! };
//! let parser = ScenarioParser::default();
//! let left = parser.parse("Base", &sheet("85"));
//! let right = parser.parse("Future", &sheet("92.5"));
//!
//! let records = compare(&left, &right, CaseType::Acca, 80.0);
//! assert_eq!(records[0].delta_display, "7.50");
//! let rows = present(&records, CaseType::Acca);
//! assert!(rows[0].is_summary());
//! ```

pub mod compare;
pub mod filter;
pub mod header;
pub mod parser;
pub mod present;
pub mod trends;

pub use compare::{
    compare, compare_all, compare_all_by_name, compare_by_name, compare_pair, ComparisonEngine,
    PairRecord, ScenarioLimit, ScenarioPercent, StraightRecord, ONLY_IN_LEFT, ONLY_IN_RIGHT,
};
pub use filter::{
    ColumnBlacklist, FilterConfig, FilterReport, RawTable, RowFilterPipeline, StageOutcome,
};
pub use header::{ColumnMap, ColumnRole, HeaderDetector, SheetLayout};
pub use parser::{
    parse_scenario_sheet, BlockSummary, ParsedSheet, ParserOptions, ScenarioParser,
    SCENARIO_SCAN_ROWS,
};
pub use present::{present, present_flat, GroupedRow, Groupable, RowRole};
pub use trends::{build_trends, normalize_issue_key, IssueTrend, SheetPeak, TrendReport};
