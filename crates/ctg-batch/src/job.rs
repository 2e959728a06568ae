use ctg_io::{pair_sheet_name, sanitize_sheet_name, MAX_SHEET_NAME};
use ctg_plan::ResolvedPlan;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Batch task categories; the label prefixes every job id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Pair,
    Straight,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Pair => "pair",
            TaskKind::Straight => "straight",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobTarget {
    Pair { left: String, right: String },
    /// Empty `sheets` means every scenario sheet of the workbook.
    Straight { sheets: Vec<String>, title: String },
}

#[derive(Debug, Clone)]
pub struct BatchJob {
    pub job_id: String,
    pub task: TaskKind,
    /// Output sheet name, unique within the batch.
    pub sheet: String,
    pub target: JobTarget,
}

impl BatchJob {
    /// Input sheets this job reads, with `scenario_sheets` standing in for an
    /// open-ended straight comparison.
    pub fn input_sheets(&self, scenario_sheets: &[String]) -> Vec<String> {
        match &self.target {
            JobTarget::Pair { left, right } => vec![left.clone(), right.clone()],
            JobTarget::Straight { sheets, .. } if sheets.is_empty() => scenario_sheets.to_vec(),
            JobTarget::Straight { sheets, .. } => sheets.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub job_id: String,
    pub task: TaskKind,
    pub sheet: String,
    pub status: String,
    pub error: Option<String>,
    /// Comparison records produced; zero for failed jobs.
    pub records: usize,
    pub output: String,
}

impl BatchJobRecord {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// One job per plan pair, in plan order, then the straight comparison.
pub fn jobs_from_plan(plan: &ResolvedPlan) -> Vec<BatchJob> {
    let mut used = HashSet::new();
    let mut jobs = Vec::with_capacity(plan.pairs.len() + 1);
    for pair in &plan.pairs {
        let sheet = unique_sheet_name(pair_sheet_name(&pair.left, &pair.right), &mut used);
        jobs.push(BatchJob {
            job_id: format!("{}:{} vs {}", TaskKind::Pair.as_str(), pair.left, pair.right),
            task: TaskKind::Pair,
            sheet,
            target: JobTarget::Pair {
                left: pair.left.clone(),
                right: pair.right.clone(),
            },
        });
    }
    if let Some(straight) = &plan.straight {
        let sheet = unique_sheet_name(sanitize_sheet_name(&straight.title), &mut used);
        jobs.push(BatchJob {
            job_id: format!("{}:{}", TaskKind::Straight.as_str(), straight.title),
            task: TaskKind::Straight,
            sheet,
            target: JobTarget::Straight {
                sheets: straight.sheets.clone(),
                title: straight.title.clone(),
            },
        });
    }
    jobs
}

/// Truncation can make two long pair names collide; later ones get a `~N`
/// suffix that still fits the sheet name limit.
fn unique_sheet_name(name: String, used: &mut HashSet<String>) -> String {
    if used.insert(name.clone()) {
        return name;
    }
    let mut n = 2;
    loop {
        let suffix = format!("~{n}");
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        let candidate: String = name.chars().take(keep).chain(suffix.chars()).collect();
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctg_plan::{resolve_plan, ComparisonPlan};

    fn resolved(yaml: &str) -> ResolvedPlan {
        let plan: ComparisonPlan = serde_yaml::from_str(yaml).unwrap();
        resolve_plan(&plan, None).unwrap()
    }

    #[test]
    fn jobs_from_plan_builds_identifiers() {
        let plan = resolved(
            "pairs:\n  - { left: Base, right: 2030/Summer }\nstraight:\n  title: All cases\n",
        );
        let jobs = jobs_from_plan(&plan);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].job_id, "pair:Base vs 2030/Summer");
        assert_eq!(jobs[0].sheet, "Base vs 2030-Summer");
        assert_eq!(jobs[1].task, TaskKind::Straight);
        assert_eq!(jobs[1].sheet, "All cases");
    }

    #[test]
    fn truncated_names_stay_unique() {
        let plan = resolved(
            "pairs:\n  - { left: Extremely long scenario name A, right: X }\n  - { left: Extremely long scenario name A, right: Y }\n",
        );
        let jobs = jobs_from_plan(&plan);
        assert_eq!(jobs[0].sheet, "Extremely long scenario name A ");
        assert_eq!(jobs[1].sheet, "Extremely long scenario name ~2");
        assert!(jobs.iter().all(|j| j.sheet.chars().count() <= MAX_SHEET_NAME));
    }

    #[test]
    fn open_straight_uses_scenario_sheets() {
        let plan = resolved("straight:\n  enabled: true\n");
        let jobs = jobs_from_plan(&plan);
        let all = vec!["A".to_string(), "B".to_string()];
        assert_eq!(jobs[0].input_sheets(&all), all);
    }
}
