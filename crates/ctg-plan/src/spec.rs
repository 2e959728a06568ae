use anyhow::{anyhow, Context, Result};
use ctg_core::CaseType;
use ctg_io::ReportFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_THRESHOLD: f64 = 80.0;
pub const DEFAULT_STRAIGHT_TITLE: &str = "Straight Comparison";

/// A comparison plan: which sheet pairs to compare and whether to add an N-way
/// comparison, read from YAML or JSON.
///
/// ```yaml
/// workbook: study.xlsx
/// threshold: 80
/// pairs:
///   - { left: Base Case, right: "2030 Summer" }
/// straight:
///   enabled: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonPlan {
    pub version: Option<u32>,
    pub workbook: Option<String>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_true")]
    pub expandable: bool,
    #[serde(default)]
    pub format: ReportFormat,
    /// Subset of case types to compare; all when absent.
    #[serde(default)]
    pub case_types: Option<Vec<String>>,
    #[serde(default)]
    pub pairs: Vec<PairSpec>,
    #[serde(default)]
    pub straight: Option<StraightSpec>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSpec {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StraightSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sheets in column order; every scenario sheet when absent.
    #[serde(default)]
    pub sheets: Option<Vec<String>>,
    pub title: Option<String>,
}

/// A plan with defaults applied and names checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPlan {
    pub workbook: Option<String>,
    pub threshold: f64,
    pub expandable: bool,
    pub format: ReportFormat,
    pub case_types: Vec<CaseType>,
    pub pairs: Vec<PairSpec>,
    pub straight: Option<ResolvedStraight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStraight {
    /// Empty means every scenario sheet of the workbook.
    pub sheets: Vec<String>,
    pub title: String,
}

pub fn load_plan_from_path(path: &Path) -> Result<ComparisonPlan> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading comparison plan '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing comparison plan yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing comparison plan json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing comparison plan"),
    }
}

/// Apply defaults and validate names. `available` is the workbook's sheet
/// list when known; every named sheet must then exist in it.
pub fn resolve_plan(plan: &ComparisonPlan, available: Option<&[String]>) -> Result<ResolvedPlan> {
    if !plan.threshold.is_finite() {
        return Err(anyhow!("threshold must be a finite number"));
    }
    let straight_enabled = plan.straight.as_ref().is_some_and(|s| s.enabled);
    if plan.pairs.is_empty() && !straight_enabled {
        return Err(anyhow!(
            "comparison plan has no pairs and no straight comparison"
        ));
    }

    let case_types = match &plan.case_types {
        None => CaseType::ALL.to_vec(),
        Some(names) => {
            let mut resolved = Vec::with_capacity(names.len());
            for name in names {
                let case_type = name
                    .parse::<CaseType>()
                    .with_context(|| format!("resolving case type '{name}'"))?;
                if !resolved.contains(&case_type) {
                    resolved.push(case_type);
                }
            }
            resolved.sort();
            resolved
        }
    };

    let check_sheet = |name: &str, context: &str| -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("{context}: sheet name cannot be empty"));
        }
        if let Some(available) = available {
            if !available.iter().any(|s| s == name) {
                return Err(anyhow!(
                    "{context}: sheet '{name}' not found in workbook (available: {})",
                    available.join(", ")
                ));
            }
        }
        Ok(())
    };

    let mut seen = HashSet::new();
    for (idx, pair) in plan.pairs.iter().enumerate() {
        let context = format!("pair {}", idx + 1);
        check_sheet(&pair.left, &context)?;
        check_sheet(&pair.right, &context)?;
        if pair.left == pair.right {
            return Err(anyhow!(
                "{context}: cannot compare sheet '{}' with itself",
                pair.left
            ));
        }
        if !seen.insert((pair.left.clone(), pair.right.clone())) {
            return Err(anyhow!(
                "duplicate pair '{}' vs '{}' in plan",
                pair.left,
                pair.right
            ));
        }
    }

    let straight = match &plan.straight {
        Some(spec) if spec.enabled => {
            let sheets = spec.sheets.clone().unwrap_or_default();
            for sheet in &sheets {
                check_sheet(sheet, "straight comparison")?;
            }
            Some(ResolvedStraight {
                sheets,
                title: spec
                    .title
                    .clone()
                    .unwrap_or_else(|| DEFAULT_STRAIGHT_TITLE.to_string()),
            })
        }
        _ => None,
    };

    Ok(ResolvedPlan {
        workbook: plan.workbook.clone(),
        threshold: plan.threshold.max(0.0),
        expandable: plan.expandable,
        format: plan.format,
        case_types,
        pairs: plan.pairs.clone(),
        straight,
    })
}

pub fn validate(plan: &ComparisonPlan, available: Option<&[String]>) -> Result<()> {
    resolve_plan(plan, available).map(|_| ())
}
