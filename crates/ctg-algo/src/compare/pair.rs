use std::collections::HashSet;

use ctg_core::{CaseType, LimitValue, ScenarioTable};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{descending, max_present, passes_threshold, CollapsedTable};

pub const ONLY_IN_LEFT: &str = "Only in left";
pub const ONLY_IN_RIGHT: &str = "Only in right";

/// One joined `(contingency, issue)` row of a left-vs-right comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub case_type: CaseType,
    pub contingency: String,
    pub issue_id: String,
    /// Display limit: shared value, `L:x | R:y` on conflict, or empty.
    pub limit: String,
    pub left_limit: Option<LimitValue>,
    pub right_limit: Option<LimitValue>,
    pub limit_conflict: bool,
    pub left_percent: Option<f64>,
    pub right_percent: Option<f64>,
    pub delta: Option<f64>,
    pub delta_display: String,
}

impl PairRecord {
    pub fn max_percent(&self) -> Option<f64> {
        max_present([self.left_percent, self.right_percent])
    }
}

fn limit_display(left: Option<&LimitValue>, right: Option<&LimitValue>) -> (String, bool) {
    match (left, right) {
        (Some(l), Some(r)) if l.agrees_with(r) => (l.to_string(), false),
        (Some(l), Some(r)) => (format!("L:{l} | R:{r}"), true),
        (Some(only), None) | (None, Some(only)) => (only.to_string(), false),
        (None, None) => (String::new(), false),
    }
}

/// Returns `None` for keys where neither side has a percent.
fn delta_of(left: Option<f64>, right: Option<f64>) -> Option<(Option<f64>, String)> {
    match (left, right) {
        (Some(l), Some(r)) => {
            let delta = r - l;
            Some((Some(delta), format!("{delta:.2}")))
        }
        (None, Some(_)) => Some((None, ONLY_IN_RIGHT.to_string())),
        (Some(_), None) => Some((None, ONLY_IN_LEFT.to_string())),
        (None, None) => None,
    }
}

/// Pairwise outer join of one case type.
///
/// Keys keep left order first, then right-only keys in right order, before the
/// final stable sort by max percent.
pub fn compare(
    left: &ScenarioTable,
    right: &ScenarioTable,
    case_type: CaseType,
    threshold: f64,
) -> Vec<PairRecord> {
    let left_rows = CollapsedTable::build(left, case_type);
    let right_rows = CollapsedTable::build(right, case_type);

    let mut seen = HashSet::new();
    let keys = left_rows
        .keys
        .iter()
        .chain(right_rows.keys.iter())
        .filter(|key| seen.insert(*key));

    let mut records: Vec<PairRecord> = keys
        .filter_map(|key| {
            let l = left_rows.get(key);
            let r = right_rows.get(key);
            let left_percent = l.and_then(|row| row.percent);
            let right_percent = r.and_then(|row| row.percent);
            let (delta, delta_display) = delta_of(left_percent, right_percent)?;
            let left_limit = l.and_then(|row| row.limit.clone());
            let right_limit = r.and_then(|row| row.limit.clone());
            let (limit, limit_conflict) = limit_display(left_limit.as_ref(), right_limit.as_ref());
            Some(PairRecord {
                case_type,
                contingency: key.0.clone(),
                issue_id: key.1.clone(),
                limit,
                left_limit,
                right_limit,
                limit_conflict,
                left_percent,
                right_percent,
                delta,
                delta_display,
            })
        })
        .filter(|record| passes_threshold(record.max_percent(), threshold))
        .collect();

    records.sort_by(|a, b| descending(a.max_percent(), b.max_percent()));
    debug!(
        left = left.name(),
        right = right.name(),
        case_type = %case_type,
        records = records.len(),
        "pair comparison"
    );
    records
}

/// Like [`compare`], with the case type given by name. Unknown names yield no rows.
pub fn compare_by_name(
    left: &ScenarioTable,
    right: &ScenarioTable,
    case_type: &str,
    threshold: f64,
) -> Vec<PairRecord> {
    match case_type.parse::<CaseType>() {
        Ok(case_type) => compare(left, right, case_type, threshold),
        Err(_) => Vec::new(),
    }
}

/// Pairwise comparison of every case type, concatenated in canonical order.
pub fn compare_pair(left: &ScenarioTable, right: &ScenarioTable, threshold: f64) -> Vec<PairRecord> {
    #[cfg(feature = "parallel")]
    let per_case: Vec<Vec<PairRecord>> = CaseType::ALL
        .par_iter()
        .map(|case_type| compare(left, right, *case_type, threshold))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let per_case: Vec<Vec<PairRecord>> = CaseType::ALL
        .iter()
        .map(|case_type| compare(left, right, *case_type, threshold))
        .collect();

    per_case.into_iter().flatten().collect()
}
