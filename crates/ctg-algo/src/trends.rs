//! How each issue's peak loading moves across scenario sheets.

use std::collections::HashMap;

use ctg_core::{CaseType, ScenarioTable};
use serde::Serialize;

use crate::compare::{descending, max_present};

/// Match key for an issue across sheets: trimmed, whitespace collapsed, upper-cased.
pub fn normalize_issue_key(issue: &str) -> String {
    issue
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPeak {
    pub sheet: String,
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueTrend {
    pub issue_key: String,
    /// Issue text as first seen.
    pub issue_display: String,
    /// One entry per sheet, in sheet order.
    pub per_sheet: Vec<SheetPeak>,
}

impl IssueTrend {
    pub fn max_percent(&self) -> Option<f64> {
        max_present(self.per_sheet.iter().map(|p| p.percent))
    }

    pub fn sheets_present(&self) -> usize {
        self.per_sheet.iter().filter(|p| p.percent.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendReport {
    pub case_type: CaseType,
    pub sheets: Vec<String>,
    /// Sorted by max percent descending.
    pub issues: Vec<IssueTrend>,
}

/// Per-sheet max percent for every issue of `case_type`, keeping issues whose
/// max across all sheets reaches `min_percent`.
pub fn build_trends(scenarios: &[&ScenarioTable], case_type: CaseType, min_percent: f64) -> TrendReport {
    let mut order: Vec<String> = Vec::new();
    let mut display: HashMap<String, String> = HashMap::new();
    let mut peaks: Vec<HashMap<String, f64>> = Vec::with_capacity(scenarios.len());

    for table in scenarios {
        let mut sheet_peaks: HashMap<String, f64> = HashMap::new();
        for record in table.for_case_type(case_type) {
            let key = normalize_issue_key(&record.issue_id);
            if key.is_empty() {
                continue;
            }
            if !display.contains_key(&key) {
                display.insert(key.clone(), record.issue_id.trim().to_string());
                order.push(key.clone());
            }
            if let Some(pct) = record.percent {
                sheet_peaks
                    .entry(key)
                    .and_modify(|peak| *peak = peak.max(pct))
                    .or_insert(pct);
            }
        }
        peaks.push(sheet_peaks);
    }

    let sheets: Vec<String> = scenarios.iter().map(|t| t.name().to_string()).collect();
    let mut issues: Vec<IssueTrend> = order
        .into_iter()
        .map(|key| {
            let per_sheet = sheets
                .iter()
                .zip(&peaks)
                .map(|(sheet, sheet_peaks)| SheetPeak {
                    sheet: sheet.clone(),
                    percent: sheet_peaks.get(&key).copied(),
                })
                .collect();
            IssueTrend {
                issue_display: display.remove(&key).unwrap_or_default(),
                issue_key: key,
                per_sheet,
            }
        })
        .filter(|trend| trend.max_percent().is_some_and(|max| max >= min_percent))
        .collect();
    issues.sort_by(|a, b| descending(a.max_percent(), b.max_percent()));

    TrendReport {
        case_type,
        sheets,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctg_core::ViolationRecord;

    #[test]
    fn per_sheet_peaks_match_normalized_issue() {
        let first = ScenarioTable::new(
            "2025",
            vec![
                ViolationRecord::new(CaseType::Acca, "C1", "Xfmr  7 ", Some(91.0)),
                ViolationRecord::new(CaseType::Acca, "C2", "xfmr 7", Some(96.0)),
                ViolationRecord::new(CaseType::Acca, "C3", "Line 9", Some(40.0)),
            ],
        );
        let second = ScenarioTable::new(
            "2030",
            vec![ViolationRecord::new(CaseType::Acca, "C1", "XFMR 7", Some(101.0))],
        );
        let third = ScenarioTable::empty("2035");

        let report = build_trends(&[&first, &second, &third], CaseType::Acca, 50.0);
        assert_eq!(report.sheets, vec!["2025", "2030", "2035"]);
        assert_eq!(report.issues.len(), 1);
        let trend = &report.issues[0];
        assert_eq!(trend.issue_key, "XFMR 7");
        assert_eq!(trend.issue_display, "Xfmr  7");
        let peaks: Vec<_> = trend.per_sheet.iter().map(|p| p.percent).collect();
        assert_eq!(peaks, vec![Some(96.0), Some(101.0), None]);
        assert_eq!(trend.sheets_present(), 2);
    }

    #[test]
    fn min_percent_is_inclusive() {
        let table = ScenarioTable::new(
            "S",
            vec![ViolationRecord::new(CaseType::DcWac, "C1", "I1", Some(80.0))],
        );
        assert_eq!(build_trends(&[&table], CaseType::DcWac, 80.0).issues.len(), 1);
        assert!(build_trends(&[&table], CaseType::DcWac, 80.5).issues.is_empty());
        assert!(build_trends(&[&table], CaseType::Acca, 0.0).issues.is_empty());
    }
}
