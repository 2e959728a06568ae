//! `ctg.toml`: defaults for comparisons, export filtering and logging.
//!
//! ```toml
//! [compare]
//! threshold = 85
//! expandable = true
//!
//! [filter]
//! keep_categories = ["Branch MVA"]
//! dedup = true
//!
//! [logging]
//! level = "warn"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use ctg_algo::filter::{
    DEFAULT_BLACKLIST_BASE_NAMES, DEFAULT_CATEGORY_COLUMN, DEFAULT_ISSUE_COLUMN,
    DEFAULT_KEEP_CATEGORY, DEFAULT_PERCENT_COLUMN,
};
use ctg_algo::{ColumnBlacklist, FilterConfig, ParserOptions};
use ctg_batch::ProcessOptions;
use ctg_plan::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "ctg.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CtgConfig {
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompareConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Group rows by issue with collapsible details.
    #[serde(default = "default_true")]
    pub expandable: bool,
    /// 0-based column holding block titles.
    #[serde(default = "default_title_column")]
    pub title_column: usize,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            expandable: true,
            title_column: default_title_column(),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_true() -> bool {
    true
}

fn default_title_column() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSection {
    #[serde(default = "default_category_column")]
    pub category_column: String,
    /// Empty keeps every category.
    #[serde(default = "default_keep_categories")]
    pub keep_categories: Vec<String>,
    #[serde(default)]
    pub dedup: bool,
    #[serde(default = "default_issue_column")]
    pub issue_column: String,
    #[serde(default = "default_percent_column")]
    pub percent_column: String,
    #[serde(default = "default_blacklist_base_names")]
    pub blacklist_base_names: Vec<String>,
    #[serde(default)]
    pub blacklist_exact_names: Vec<String>,
    #[serde(default)]
    pub delete_original: bool,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            category_column: default_category_column(),
            keep_categories: default_keep_categories(),
            dedup: false,
            issue_column: default_issue_column(),
            percent_column: default_percent_column(),
            blacklist_base_names: default_blacklist_base_names(),
            blacklist_exact_names: Vec::new(),
            delete_original: false,
        }
    }
}

fn default_category_column() -> String {
    DEFAULT_CATEGORY_COLUMN.to_string()
}

fn default_keep_categories() -> Vec<String> {
    vec![DEFAULT_KEEP_CATEGORY.to_string()]
}

fn default_issue_column() -> String {
    DEFAULT_ISSUE_COLUMN.to_string()
}

fn default_percent_column() -> String {
    DEFAULT_PERCENT_COLUMN.to_string()
}

fn default_blacklist_base_names() -> Vec<String> {
    DEFAULT_BLACKLIST_BASE_NAMES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl FilterSection {
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            category_column: self.category_column.clone(),
            keep_categories: self.keep_categories.iter().cloned().collect(),
            dedup_by_issue: self.dedup,
            issue_column: self.issue_column.clone(),
            percent_column: self.percent_column.clone(),
            blacklist: ColumnBlacklist {
                base_names: self.blacklist_base_names.iter().cloned().collect(),
                exact_names: self.blacklist_exact_names.iter().cloned().collect(),
            },
        }
    }

    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            filter: self.filter_config(),
            delete_original: self.delete_original,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CtgConfig {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            title_column: self.compare.title_column,
            ..ParserOptions::default()
        }
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging
            .level
            .parse()
            .map_err(|_| anyhow!("invalid log level '{}' in configuration", self.logging.level))
    }
}

/// Load `explicit` (which must exist), else `./ctg.toml` when present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<CtgConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let local = PathBuf::from(CONFIG_FILE);
            if !local.is_file() {
                return Ok(CtgConfig::default());
            }
            local
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<CtgConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading configuration '{}'", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing configuration '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_file_means_defaults() {
        let config: CtgConfig = toml::from_str("").unwrap();
        assert_eq!(config, CtgConfig::default());
        assert_eq!(config.compare.threshold, 80.0);
        let filter = config.filter.filter_config();
        assert_eq!(filter, FilterConfig::default());
    }

    #[test]
    fn sections_override_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ctg.toml");
        fs::write(
            &path,
            "[compare]\nthreshold = 95.5\ntitle_column = 0\n\n[filter]\nkeep_categories = []\ndedup = true\ndelete_original = true\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.compare.threshold, 95.5);
        assert!(config.compare.expandable);
        assert_eq!(config.parser_options().title_column, 0);
        let options = config.filter.process_options();
        assert!(options.filter.keep_categories.is_empty());
        assert!(options.filter.dedup_by_issue);
        assert!(options.delete_original);
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
