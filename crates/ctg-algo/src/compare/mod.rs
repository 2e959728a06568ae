//! Outer-join comparisons across parsed scenarios.
//!
//! Both comparisons key rows on `(contingency, issue_id)` within one case type:
//!
//! - [`pair`]: left vs right with a delta or an "only in" status
//! - [`straight`]: every scenario at once, one percent column per scenario
//!
//! Before joining, each scenario's duplicate keys are collapsed to a single row
//! (max percent, first non-blank limit). After joining, rows without any
//! percent are dropped, the inclusive threshold is applied to the max of the
//! present percents, and rows are stably sorted by that max, descending.

use std::cmp::Ordering;
use std::collections::HashMap;

use ctg_core::{CaseType, LimitValue, ScenarioTable};

pub mod pair;
pub mod straight;

pub use pair::{compare, compare_by_name, compare_pair, PairRecord, ONLY_IN_LEFT, ONLY_IN_RIGHT};
pub use straight::{
    compare_all, compare_all_by_name, ScenarioLimit, ScenarioPercent, StraightRecord,
};

pub type JoinKey = (String, String);

/// One scenario's view of a key after duplicates were collapsed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CollapsedRow {
    pub limit: Option<LimitValue>,
    pub percent: Option<f64>,
}

/// Rows of one case type keyed by `(contingency, issue_id)`, in first-seen order.
#[derive(Debug, Default)]
pub(crate) struct CollapsedTable {
    pub keys: Vec<JoinKey>,
    pub rows: HashMap<JoinKey, CollapsedRow>,
}

impl CollapsedTable {
    pub fn build(table: &ScenarioTable, case_type: CaseType) -> Self {
        let mut collapsed = CollapsedTable::default();
        for record in table.for_case_type(case_type) {
            let key = (record.contingency.clone(), record.issue_id.clone());
            match collapsed.rows.get_mut(&key) {
                Some(row) => {
                    row.percent = max_present([row.percent, record.percent]);
                    if row.limit.is_none() {
                        row.limit = record.limit.clone();
                    }
                }
                None => {
                    collapsed.keys.push(key.clone());
                    collapsed.rows.insert(
                        key,
                        CollapsedRow {
                            limit: record.limit.clone(),
                            percent: record.percent,
                        },
                    );
                }
            }
        }
        collapsed
    }

    pub fn get(&self, key: &JoinKey) -> Option<&CollapsedRow> {
        self.rows.get(key)
    }
}

/// Largest present value; `None` when nothing is present.
pub fn max_present<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

/// Descending order with missing values last.
pub fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Threshold test on the max of present percents; inclusive.
pub fn passes_threshold(max_percent: Option<f64>, threshold: f64) -> bool {
    max_percent.is_some_and(|max| max >= threshold)
}

/// Comparison entry point holding the threshold shared by a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonEngine {
    threshold: f64,
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self { threshold: 0.0 }
    }
}

impl ComparisonEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn compare(
        &self,
        left: &ScenarioTable,
        right: &ScenarioTable,
        case_type: CaseType,
    ) -> Vec<PairRecord> {
        compare(left, right, case_type, self.threshold)
    }

    pub fn compare_pair(&self, left: &ScenarioTable, right: &ScenarioTable) -> Vec<PairRecord> {
        compare_pair(left, right, self.threshold)
    }

    pub fn compare_all(
        &self,
        scenarios: &[(&str, &ScenarioTable)],
        case_type: CaseType,
    ) -> Vec<StraightRecord> {
        compare_all(scenarios, case_type, self.threshold)
    }

    /// Straight comparison for every case type, concatenated in canonical order.
    pub fn compare_all_case_types(
        &self,
        scenarios: &[(&str, &ScenarioTable)],
    ) -> Vec<StraightRecord> {
        CaseType::ALL
            .into_iter()
            .flat_map(|case_type| compare_all(scenarios, case_type, self.threshold))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctg_core::ViolationRecord;

    #[test]
    fn max_ignores_missing() {
        assert_eq!(max_present([None, Some(60.0), None, Some(81.0)]), Some(81.0));
        assert_eq!(max_present([None, None]), None);
        assert_eq!(max_present(Vec::new()), None);
    }

    #[test]
    fn descending_puts_missing_last() {
        let mut values = vec![None, Some(10.0), Some(30.0), None, Some(20.0)];
        values.sort_by(|a, b| descending(*a, *b));
        assert_eq!(values, vec![Some(30.0), Some(20.0), Some(10.0), None, None]);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(passes_threshold(Some(80.0), 80.0));
        assert!(!passes_threshold(Some(79.0), 80.0));
        assert!(!passes_threshold(None, 0.0));
    }

    #[test]
    fn collapse_keeps_max_percent_and_first_limit() {
        let table = ScenarioTable::new(
            "S",
            vec![
                ViolationRecord::new(CaseType::Acca, "C1", "I2", Some(70.0)),
                ViolationRecord::new(CaseType::Acca, "C1", "I2", Some(95.0))
                    .with_limit(LimitValue::Number(400.0)),
                ViolationRecord::new(CaseType::Acca, "C1", "I2", None)
                    .with_limit(LimitValue::Number(500.0)),
                ViolationRecord::new(CaseType::DcWac, "C1", "I2", Some(99.0)),
            ],
        );
        let collapsed = CollapsedTable::build(&table, CaseType::Acca);
        assert_eq!(collapsed.keys.len(), 1);
        let row = collapsed.get(&("C1".into(), "I2".into())).unwrap();
        assert_eq!(row.percent, Some(95.0));
        assert_eq!(row.limit, Some(LimitValue::Number(400.0)));
    }
}
