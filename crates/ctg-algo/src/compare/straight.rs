use std::collections::HashSet;

use ctg_core::{CaseType, LimitValue, ScenarioTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{descending, max_present, passes_threshold, CollapsedTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPercent {
    pub scenario: String,
    pub percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioLimit {
    pub scenario: String,
    pub limit: Option<LimitValue>,
}

/// One joined `(contingency, issue)` row across every compared scenario.
///
/// `percents` and `limits` hold exactly one entry per requested scenario, in
/// request order. `limit` is the most recently merged non-blank limit; when
/// scenarios disagree `limit_conflict` is set and `limits` keeps every value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StraightRecord {
    pub case_type: CaseType,
    pub contingency: String,
    pub issue_id: String,
    pub limit: Option<LimitValue>,
    pub limit_conflict: bool,
    pub limits: Vec<ScenarioLimit>,
    pub percents: Vec<ScenarioPercent>,
}

impl StraightRecord {
    pub fn max_percent(&self) -> Option<f64> {
        max_present(self.percents.iter().map(|p| p.percent))
    }

    pub fn percent_for(&self, scenario: &str) -> Option<f64> {
        self.percents
            .iter()
            .find(|p| p.scenario == scenario)
            .and_then(|p| p.percent)
    }

    /// Limit for display; conflicting limits list every distinct value.
    pub fn limit_display(&self) -> String {
        if !self.limit_conflict {
            return self.limit.as_ref().map(ToString::to_string).unwrap_or_default();
        }
        let mut distinct: Vec<&LimitValue> = Vec::new();
        for limit in self.limits.iter().filter_map(|l| l.limit.as_ref()) {
            if !distinct.iter().any(|seen| seen.agrees_with(limit)) {
                distinct.push(limit);
            }
        }
        distinct
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// N-way outer join of one case type across `scenarios`, in the given order.
///
/// Keys appear in the order the sequential join first meets them, then are
/// stably sorted by max percent descending.
pub fn compare_all(
    scenarios: &[(&str, &ScenarioTable)],
    case_type: CaseType,
    threshold: f64,
) -> Vec<StraightRecord> {
    let collapsed: Vec<(&str, CollapsedTable)> = scenarios
        .iter()
        .map(|(label, table)| (*label, CollapsedTable::build(table, case_type)))
        .collect();

    let mut seen = HashSet::new();
    let keys: Vec<_> = collapsed
        .iter()
        .flat_map(|(_, table)| table.keys.iter())
        .filter(|key| seen.insert(*key))
        .collect();

    let mut records: Vec<StraightRecord> = keys
        .into_iter()
        .map(|key| {
            let mut percents = Vec::with_capacity(collapsed.len());
            let mut limits = Vec::with_capacity(collapsed.len());
            let mut limit: Option<LimitValue> = None;
            let mut limit_conflict = false;
            for (label, table) in &collapsed {
                let row = table.get(key);
                let row_limit = row.and_then(|r| r.limit.clone());
                if let Some(new_limit) = &row_limit {
                    if let Some(current) = &limit {
                        limit_conflict |= !current.agrees_with(new_limit);
                    }
                    limit = Some(new_limit.clone());
                }
                percents.push(ScenarioPercent {
                    scenario: label.to_string(),
                    percent: row.and_then(|r| r.percent),
                });
                limits.push(ScenarioLimit {
                    scenario: label.to_string(),
                    limit: row_limit,
                });
            }
            StraightRecord {
                case_type,
                contingency: key.0.clone(),
                issue_id: key.1.clone(),
                limit,
                limit_conflict,
                limits,
                percents,
            }
        })
        .filter(|record| passes_threshold(record.max_percent(), threshold))
        .collect();

    records.sort_by(|a, b| descending(a.max_percent(), b.max_percent()));
    debug!(
        scenarios = scenarios.len(),
        case_type = %case_type,
        records = records.len(),
        "straight comparison"
    );
    records
}

/// Like [`compare_all`], with the case type given by name. Unknown names yield no rows.
pub fn compare_all_by_name(
    scenarios: &[(&str, &ScenarioTable)],
    case_type: &str,
    threshold: f64,
) -> Vec<StraightRecord> {
    match case_type.parse::<CaseType>() {
        Ok(case_type) => compare_all(scenarios, case_type, threshold),
        Err(_) => Vec::new(),
    }
}
