//! Column role detection for scenario block header rows.
//!
//! Two sheet layouts are in circulation (columns shown as spreadsheet letters):
//!
//! ```text
//! legacy : B Contingency Events | C Resulting Issue | D Contingency Value (MVA) | E Percent Loading
//! current: B Contingency Events | C Resulting Issue | D Limit | E Contingency Value (MVA) | F Percent Loading
//! ```
//!
//! Headers are matched case-insensitively after collapsing whitespace. Roles the
//! header row does not name are filled from the layout positions above, so
//! detection always yields a usable [`ColumnMap`].

use ctg_core::Cell;
use serde::Serialize;

/// Column B, 0-based.
pub const DEFAULT_CONTINGENCY_COLUMN: usize = 1;
/// Column C, 0-based.
pub const DEFAULT_ISSUE_COLUMN: usize = 2;
/// Column E: percent position in the legacy layout.
pub const LEGACY_PERCENT_COLUMN: usize = 4;
/// Column F: percent position in the current (limit-aware) layout.
pub const CURRENT_PERCENT_COLUMN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    Contingency,
    Issue,
    Limit,
    Value,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetLayout {
    /// Contingency, issue, value, percent
    Legacy,
    /// Contingency, issue, limit, value, percent
    Current,
}

/// 0-based column index for each role found in a header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub contingency: usize,
    pub issue: usize,
    pub limit: Option<usize>,
    pub value: Option<usize>,
    pub percent: usize,
    /// Roles whose column came from the layout fallback instead of a header.
    pub inferred: Vec<ColumnRole>,
}

impl ColumnMap {
    pub fn layout(&self) -> SheetLayout {
        if self.limit.is_some() {
            SheetLayout::Current
        } else {
            SheetLayout::Legacy
        }
    }

    pub fn used_fallback(&self) -> bool {
        !self.inferred.is_empty()
    }

    /// Every mapped column, in role order.
    pub fn columns(&self) -> Vec<usize> {
        let mut cols = vec![self.contingency, self.issue];
        cols.extend(self.limit);
        cols.extend(self.value);
        cols.push(self.percent);
        cols
    }

    fn occupied(&self, col: usize) -> bool {
        self.columns().contains(&col)
    }
}

/// Lower-case, trim and collapse internal whitespace (including line breaks).
pub fn normalize_header(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Role named by a single header cell, if any.
pub fn classify_header(text: &str) -> Option<ColumnRole> {
    let h = normalize_header(text);
    if h.is_empty() {
        return None;
    }
    if h.contains("ctglabel") || (h.contains("contingency") && !h.contains("value")) {
        return Some(ColumnRole::Contingency);
    }
    if h.contains("issue") || h.contains("limviolid") {
        return Some(ColumnRole::Issue);
    }
    if h.contains("percent") || h.contains("pct") || h.contains("loading") {
        return Some(ColumnRole::Percent);
    }
    // "Limit (MVA)" is a limit; only "value" moves a limit header to Value
    if h.contains("limit") && !h.contains("value") {
        return Some(ColumnRole::Limit);
    }
    if h.contains("value") || h.contains("mva") {
        return Some(ColumnRole::Value);
    }
    None
}

pub struct HeaderDetector;

impl HeaderDetector {
    /// Map column roles from a header row. Never fails: when the header does not
    /// name a role the layout fallback supplies it, and optional roles that
    /// cannot be placed without colliding with another role are left out.
    pub fn detect(header: &[Cell]) -> ColumnMap {
        let mut contingency = None;
        let mut issue = None;
        let mut limit = None;
        let mut value = None;
        let mut percent = None;

        for (col, cell) in header.iter().enumerate() {
            let slot = match classify_header(&cell.as_trimmed_text()) {
                Some(ColumnRole::Contingency) => &mut contingency,
                Some(ColumnRole::Issue) => &mut issue,
                Some(ColumnRole::Limit) => &mut limit,
                Some(ColumnRole::Value) => &mut value,
                Some(ColumnRole::Percent) => &mut percent,
                None => continue,
            };
            // first header naming a role wins
            slot.get_or_insert(col);
        }

        let mut inferred = Vec::new();
        let contingency = contingency.unwrap_or_else(|| {
            inferred.push(ColumnRole::Contingency);
            DEFAULT_CONTINGENCY_COLUMN
        });
        let issue = issue.unwrap_or_else(|| {
            inferred.push(ColumnRole::Issue);
            DEFAULT_ISSUE_COLUMN
        });
        let percent = match percent {
            Some(col) => col,
            None => {
                inferred.push(ColumnRole::Percent);
                value
                    .map(|v| v + 1)
                    .or(limit.map(|l| l + 2))
                    .unwrap_or(LEGACY_PERCENT_COLUMN)
            }
        };

        let mut map = ColumnMap {
            contingency,
            issue,
            limit,
            value,
            percent,
            inferred,
        };

        let value_named = map.value.is_some();
        if !value_named {
            if let Some(col) = percent.checked_sub(1).filter(|c| !map.occupied(*c)) {
                map.value = Some(col);
                map.inferred.push(ColumnRole::Value);
            }
        }
        // a named value column fixes the layout, so column D is not guessed
        if map.limit.is_none() && !value_named && percent == CURRENT_PERCENT_COLUMN {
            if let Some(col) = percent.checked_sub(2).filter(|c| !map.occupied(*c)) {
                map.limit = Some(col);
                map.inferred.push(ColumnRole::Limit);
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> Vec<Cell> {
        cells.iter().map(|s| Cell::from(*s)).collect()
    }

    #[test]
    fn detects_legacy_layout() {
        let map = HeaderDetector::detect(&header(&[
            "",
            "Contingency Events",
            "Resulting Issue",
            "Contingency Value (MVA)",
            "Percent Loading",
        ]));
        assert_eq!(map.contingency, 1);
        assert_eq!(map.issue, 2);
        assert_eq!(map.value, Some(3));
        assert_eq!(map.percent, 4);
        assert_eq!(map.limit, None);
        assert_eq!(map.layout(), SheetLayout::Legacy);
        assert!(!map.used_fallback());
    }

    #[test]
    fn detects_current_layout_with_export_names() {
        let map = HeaderDetector::detect(&header(&[
            "",
            "CTGLabel",
            "LimViolID",
            "LimViolLimit",
            "LimViolValue",
            "LimViolPct",
        ]));
        assert_eq!(map.limit, Some(3));
        assert_eq!(map.value, Some(4));
        assert_eq!(map.percent, 5);
        assert_eq!(map.layout(), SheetLayout::Current);
    }

    #[test]
    fn matching_ignores_case_and_line_breaks() {
        assert_eq!(classify_header("  PERCENT\nLoading "), Some(ColumnRole::Percent));
        assert_eq!(classify_header("Contingency\n Value (MVA)"), Some(ColumnRole::Value));
        assert_eq!(classify_header("Limit"), Some(ColumnRole::Limit));
        assert_eq!(classify_header("Limit Value"), Some(ColumnRole::Value));
        assert_eq!(classify_header("Owner"), None);
    }

    #[test]
    fn blank_header_falls_back_to_legacy_positions() {
        let map = HeaderDetector::detect(&[]);
        assert_eq!(map.contingency, 1);
        assert_eq!(map.issue, 2);
        assert_eq!(map.value, Some(3));
        assert_eq!(map.percent, 4);
        assert_eq!(map.limit, None);
        assert!(map.used_fallback());
    }

    #[test]
    fn percent_in_current_position_infers_limit_and_value() {
        let map = HeaderDetector::detect(&header(&[
            "",
            "Contingency Events",
            "Resulting Issue",
            "",
            "",
            "Percent Loading",
        ]));
        assert_eq!(map.percent, 5);
        assert_eq!(map.value, Some(4));
        assert_eq!(map.limit, Some(3));
        assert_eq!(map.inferred, vec![ColumnRole::Value, ColumnRole::Limit]);
    }

    #[test]
    fn value_header_without_percent_places_percent_after_it() {
        let map = HeaderDetector::detect(&header(&[
            "",
            "Contingency Events",
            "Resulting Issue",
            "Limit",
            "Contingency Value (MVA)",
        ]));
        assert_eq!(map.percent, 5);
        assert_eq!(map.value, Some(4));
        assert_eq!(map.limit, Some(3));
        assert_eq!(map.inferred, vec![ColumnRole::Percent]);
    }

    #[test]
    fn limit_header_with_unit_suffix_stays_limit() {
        assert_eq!(classify_header("Limit (MVA)"), Some(ColumnRole::Limit));
        assert_eq!(classify_header("Limit MVA"), Some(ColumnRole::Limit));
        let map = HeaderDetector::detect(&header(&[
            "",
            "Contingency Events",
            "Resulting Issue",
            "Limit (MVA)",
            "Contingency Value (MVA)",
            "Percent Loading",
        ]));
        assert_eq!(map.limit, Some(3));
        assert_eq!(map.value, Some(4));
        assert_eq!(map.percent, 5);
        assert_eq!(map.layout(), SheetLayout::Current);
        assert!(!map.used_fallback());
    }

    #[test]
    fn issue_headers_with_suffixes_are_recognized() {
        assert_eq!(classify_header("Issue ID"), Some(ColumnRole::Issue));
        assert_eq!(classify_header("Issue Name"), Some(ColumnRole::Issue));
        let map = HeaderDetector::detect(&header(&[
            "Contingency",
            "Owner",
            "Issue Name",
            "Contingency Value (MVA)",
            "Percent Loading",
        ]));
        assert_eq!(map.issue, 2);
        assert_eq!(map.contingency, 0);
        assert!(!map.inferred.contains(&ColumnRole::Issue));
    }

    #[test]
    fn named_value_column_suppresses_limit_guess() {
        let map = HeaderDetector::detect(&header(&[
            "",
            "Contingency Events",
            "Resulting Issue",
            "Owner",
            "Contingency Value (MVA)",
            "Percent Loading",
        ]));
        assert_eq!(map.value, Some(4));
        assert_eq!(map.percent, 5);
        assert_eq!(map.limit, None);
        assert!(map.inferred.is_empty());
    }

    #[test]
    fn inferred_columns_never_collide_with_named_ones() {
        let map = HeaderDetector::detect(&header(&["Contingency", "Issue", "Pct"]));
        assert_eq!(map.percent, 2);
        assert_eq!(map.value, None);
        assert_eq!(map.columns(), vec![0, 1, 2]);
    }
}
