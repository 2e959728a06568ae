//! Issue grouping for outline-style output.
//!
//! Records are grouped by issue id. Each group becomes one `Summary` row (its
//! highest-loaded record) directly followed by hidden `Detail` rows at
//! outline level 1. The presenter only assigns roles and levels; styling and
//! collapse mechanics belong to the sink.

use std::collections::HashMap;

use ctg_core::CaseType;
use serde::Serialize;

use crate::compare::{descending, max_present, PairRecord, StraightRecord};

/// What the presenter needs to know about a comparison record.
pub trait Groupable {
    fn case_type(&self) -> CaseType;
    fn issue_id(&self) -> &str;
    fn max_percent(&self) -> Option<f64>;
}

impl Groupable for PairRecord {
    fn case_type(&self) -> CaseType {
        self.case_type
    }

    fn issue_id(&self) -> &str {
        &self.issue_id
    }

    fn max_percent(&self) -> Option<f64> {
        PairRecord::max_percent(self)
    }
}

impl Groupable for StraightRecord {
    fn case_type(&self) -> CaseType {
        self.case_type
    }

    fn issue_id(&self) -> &str {
        &self.issue_id
    }

    fn max_percent(&self) -> Option<f64> {
        StraightRecord::max_percent(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRole {
    Summary,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRow<'a, R> {
    pub record: &'a R,
    pub role: RowRole,
    pub collapse_level: u8,
    pub visible: bool,
    /// True only on a Summary row that has Detail rows under it.
    pub collapsible: bool,
    pub group_size: usize,
}

impl<R> GroupedRow<'_, R> {
    pub fn is_summary(&self) -> bool {
        self.role == RowRole::Summary
    }
}

/// Expandable issue view: one Summary per issue, Details hidden beneath it.
///
/// Groups are ordered by their max percent descending, members likewise; ties
/// keep the input order. Records of other case types are ignored.
pub fn present<R: Groupable>(records: &[R], case_type: CaseType) -> Vec<GroupedRow<'_, R>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&R>> = Vec::new();
    for record in records.iter().filter(|r| r.case_type() == case_type) {
        let slot = *index.entry(record.issue_id()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(record);
    }

    for members in &mut groups {
        members.sort_by(|a, b| descending(a.max_percent(), b.max_percent()));
    }
    let group_max = |members: &Vec<&R>| max_present(members.iter().map(|r| r.max_percent()));
    groups.sort_by(|a, b| descending(group_max(a), group_max(b)));

    let mut rows = Vec::with_capacity(records.len());
    for members in groups {
        let group_size = members.len();
        for (rank, record) in members.into_iter().enumerate() {
            let summary = rank == 0;
            rows.push(GroupedRow {
                record,
                role: if summary { RowRole::Summary } else { RowRole::Detail },
                collapse_level: if summary { 0 } else { 1 },
                visible: summary,
                collapsible: summary && group_size > 1,
                group_size,
            });
        }
    }
    rows
}

/// Flat view: every record is a visible Summary row, sorted by max percent.
pub fn present_flat<R: Groupable>(records: &[R], case_type: CaseType) -> Vec<GroupedRow<'_, R>> {
    let mut selected: Vec<&R> = records
        .iter()
        .filter(|r| r.case_type() == case_type)
        .collect();
    selected.sort_by(|a, b| descending(a.max_percent(), b.max_percent()));
    selected
        .into_iter()
        .map(|record| GroupedRow {
            record,
            role: RowRole::Summary,
            collapse_level: 0,
            visible: true,
            collapsible: false,
            group_size: 1,
        })
        .collect()
}
