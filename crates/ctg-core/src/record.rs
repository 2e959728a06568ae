use serde::{Deserialize, Serialize};
use std::fmt;

use crate::case_type::CaseType;
use crate::grid::{format_number, parse_number, Cell};

/// Two numeric limits closer than this are the same limit.
pub const LIMIT_TOLERANCE: f64 = 1e-9;

/// A violation limit as reported: usually a rating in MVA, sometimes free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
    Number(f64),
    Text(String),
}

impl LimitValue {
    /// Read a limit cell. Blank cells have no limit; numeric-looking text is a number.
    pub fn from_cell(cell: &Cell) -> Option<Self> {
        if cell.is_blank() {
            return None;
        }
        match cell.as_number() {
            Some(n) => Some(LimitValue::Number(n)),
            None => Some(LimitValue::Text(cell.as_trimmed_text())),
        }
    }

    pub fn from_text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        match parse_number(trimmed) {
            Some(n) => Some(LimitValue::Number(n)),
            None => Some(LimitValue::Text(trimmed.to_string())),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            LimitValue::Number(n) => Some(*n),
            LimitValue::Text(_) => None,
        }
    }

    /// Numbers agree within [`LIMIT_TOLERANCE`]; anything else must match textually.
    pub fn agrees_with(&self, other: &LimitValue) -> bool {
        match (self, other) {
            (LimitValue::Number(a), LimitValue::Number(b)) => (a - b).abs() <= LIMIT_TOLERANCE,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for LimitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitValue::Number(n) => f.write_str(&format_number(*n)),
            LimitValue::Text(s) => f.write_str(s),
        }
    }
}

/// One reported violation of one case type under one contingency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub case_type: CaseType,
    pub contingency: String,
    pub issue_id: String,
    pub limit: Option<LimitValue>,
    pub value: Option<f64>,
    pub percent: Option<f64>,
}

impl ViolationRecord {
    pub fn new(
        case_type: CaseType,
        contingency: impl Into<String>,
        issue_id: impl Into<String>,
        percent: Option<f64>,
    ) -> Self {
        Self {
            case_type,
            contingency: contingency.into(),
            issue_id: issue_id.into(),
            limit: None,
            value: None,
            percent,
        }
    }

    pub fn with_limit(mut self, limit: LimitValue) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// All records parsed from one scenario (a sheet or an exported CSV).
///
/// Tables are immutable once built; consumers derive new structures from them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    name: String,
    records: Vec<ViolationRecord>,
}

impl ScenarioTable {
    pub fn new(name: impl Into<String>, records: Vec<ViolationRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[ViolationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_case_type(&self, case_type: CaseType) -> impl Iterator<Item = &ViolationRecord> {
        self.records
            .iter()
            .filter(move |record| record.case_type == case_type)
    }

    /// Case types present in the table, in canonical order.
    pub fn case_types(&self) -> Vec<CaseType> {
        CaseType::ALL
            .into_iter()
            .filter(|ct| self.records.iter().any(|r| r.case_type == *ct))
            .collect()
    }
}
