//! Study case types and the block titles that introduce them on scenario sheets.
//!
//! Every violation report is split into three fixed study categories. Each one has
//! three spellings that show up in the wild:
//!
//! | variant          | canonical name   | block title     | case file pattern |
//! |------------------|------------------|-----------------|-------------------|
//! | `AccaLongTerm`   | `ACCA_LongTerm`  | `ACCA LongTerm` | `ACCA_LongTerm`   |
//! | `Acca`           | `ACCA_P1,2,4,7`  | `ACCA`          | `ACCA_P1,2,4,7`   |
//! | `DcWac`          | `DCwACver_P1-7`  | `DCwAC`         | `DCwACver_P1-7`   |
//!
//! Variant order is the canonical output order used by every comparison.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CtgError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CaseType {
    #[serde(rename = "ACCA_LongTerm")]
    AccaLongTerm,
    #[serde(rename = "ACCA_P1,2,4,7")]
    Acca,
    #[serde(rename = "DCwACver_P1-7")]
    DcWac,
}

impl CaseType {
    /// All case types in canonical order.
    pub const ALL: [CaseType; 3] = [CaseType::AccaLongTerm, CaseType::Acca, CaseType::DcWac];

    pub fn canonical(&self) -> &'static str {
        match self {
            CaseType::AccaLongTerm => "ACCA_LongTerm",
            CaseType::Acca => "ACCA_P1,2,4,7",
            CaseType::DcWac => "DCwACver_P1-7",
        }
    }

    /// Name used for block titles on scenario sheets and comparison reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            CaseType::AccaLongTerm => "ACCA LongTerm",
            CaseType::Acca => "ACCA",
            CaseType::DcWac => "DCwAC",
        }
    }

    /// Substring that identifies a case file of this type.
    pub fn file_pattern(&self) -> &'static str {
        self.canonical()
    }

    /// Position in the canonical order (0-based).
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl FromStr for CaseType {
    type Err = CtgError;

    /// Accepts canonical names, block titles and the short command-line spellings
    /// (`acca-longterm`, `acca`, `dcwac`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let short = wanted.replace(['-', '_', ' '], "");
        for case_type in CaseType::ALL {
            if case_type.canonical().to_ascii_lowercase() == wanted
                || case_type.display_name().to_ascii_lowercase() == wanted
            {
                return Ok(case_type);
            }
        }
        match short.as_str() {
            "accalongterm" | "longterm" => Ok(CaseType::AccaLongTerm),
            "acca" => Ok(CaseType::Acca),
            "dcwac" | "dcwacver" => Ok(CaseType::DcWac),
            _ => Err(CtgError::Config(format!(
                "unknown case type '{s}' (expected one of ACCA_LongTerm, ACCA_P1,2,4,7, DCwACver_P1-7)"
            ))),
        }
    }
}

static DEFAULT_TITLES: Lazy<HashMap<String, CaseType>> = Lazy::new(|| {
    HashMap::from([
        ("ACCA LongTerm".to_string(), CaseType::AccaLongTerm),
        ("ACCA Long Term".to_string(), CaseType::AccaLongTerm),
        ("ACCA".to_string(), CaseType::Acca),
        ("DCwAC".to_string(), CaseType::DcWac),
    ])
});

/// The set of block titles that open a case-type block on a scenario sheet.
///
/// Title matching is exact after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseTypeTitles {
    titles: HashMap<String, CaseType>,
}

impl Default for CaseTypeTitles {
    fn default() -> Self {
        Self {
            titles: DEFAULT_TITLES.clone(),
        }
    }
}

impl CaseTypeTitles {
    /// An empty title set; no block will ever be recognized.
    pub fn empty() -> Self {
        Self {
            titles: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>, case_type: CaseType) -> Self {
        self.titles.insert(title.into().trim().to_string(), case_type);
        self
    }

    pub fn lookup(&self, text: &str) -> Option<CaseType> {
        self.titles.get(text.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
