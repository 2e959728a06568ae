use clap::{CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use ctg_core::CaseType;
use ctg_io::ReportFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ctg", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level [default: info, or `[logging] level` from the config]
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (defaults to ./ctg.toml when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the scenario sheets of a workbook
    Sheets {
        /// Workbook file (.xlsx/.xlsm/.xls/.ods) or directory of CSV sheets
        #[arg(value_hint = ValueHint::AnyPath)]
        workbook: PathBuf,
        /// List every sheet, not only scenario sheets
        #[arg(long)]
        all: bool,
    },
    /// Parse one scenario sheet into normalized violation records
    Parse {
        #[arg(value_hint = ValueHint::AnyPath)]
        workbook: PathBuf,
        /// Sheet to parse
        #[arg(long)]
        sheet: String,
        /// Write records here instead of printing them
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "csv")]
        format: ReportFormat,
        /// Print block locations and parse diagnostics
        #[arg(long)]
        diagnostics: bool,
    },
    /// Compare two scenario sheets
    Compare {
        #[arg(value_hint = ValueHint::AnyPath)]
        workbook: PathBuf,
        /// Left (baseline) sheet
        #[arg(long)]
        left: String,
        /// Right sheet
        #[arg(long)]
        right: String,
        /// Minimum percent loading to report [default: 80]
        #[arg(long)]
        threshold: Option<f64>,
        /// Restrict to one case type (acca-longterm, acca, dcwac)
        #[arg(long)]
        case_type: Option<CaseType>,
        /// One row per record instead of grouping by issue
        #[arg(long)]
        flat: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "csv")]
        format: ReportFormat,
    },
    /// Compare any number of scenario sheets side by side
    Straight {
        #[arg(value_hint = ValueHint::AnyPath)]
        workbook: PathBuf,
        /// Comma-separated sheets in column order; every scenario sheet when omitted
        #[arg(long)]
        sheets: Option<String>,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        case_type: Option<CaseType>,
        #[arg(long)]
        flat: bool,
        /// Report title
        #[arg(long, default_value = "Straight Comparison")]
        title: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "csv")]
        format: ReportFormat,
    },
    /// Peak loading of each issue across scenario sheets
    Trends {
        #[arg(value_hint = ValueHint::AnyPath)]
        workbook: PathBuf,
        #[arg(long)]
        case_type: CaseType,
        /// Keep issues whose peak across sheets reaches this percent
        #[arg(long, default_value_t = 0.0)]
        min_percent: f64,
        /// Comma-separated sheets; every scenario sheet when omitted
        #[arg(long)]
        sheets: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run the comparisons of a plan file
    Batch {
        /// Comparison plan (YAML or JSON)
        #[arg(long, value_hint = ValueHint::FilePath)]
        plan: PathBuf,
        /// Workbook to use instead of the plan's `workbook`
        #[arg(long, value_hint = ValueHint::AnyPath)]
        workbook: Option<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "ctg-batch")]
        out: PathBuf,
        /// Worker threads (auto or a number)
        #[arg(long, default_value = "auto")]
        threads: String,
    },
    /// Filter a raw violation export
    Filter {
        /// Raw export CSV (descriptive first row, headers on row 2)
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Comma-separated categories to keep; empty keeps every category
        #[arg(long)]
        categories: Option<String>,
        /// Keep only the highest-loaded row per issue
        #[arg(long)]
        dedup: bool,
        /// Output CSV [default: <input>_Filtered.csv]
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Export and filter case files
    Process {
        /// Case files, or folders to scan for .pwb case files
        #[arg(required = true, value_hint = ValueHint::AnyPath)]
        cases: Vec<PathBuf>,
        #[arg(long)]
        dedup: bool,
        /// Delete each raw export after its filtered copy is written
        #[arg(long)]
        delete_original: bool,
        #[arg(long, default_value = "auto")]
        threads: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
        /// Write output to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn parses_compare_flags() {
        let cli = Cli::try_parse_from([
            "ctg",
            "compare",
            "study.xlsx",
            "--left",
            "Base",
            "--right",
            "Future",
            "--case-type",
            "dcwac",
            "--format",
            "json",
            "--flat",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare {
                case_type,
                format,
                flat,
                threshold,
                ..
            } => {
                assert_eq!(case_type, Some(CaseType::DcWac));
                assert_eq!(format, ReportFormat::Json);
                assert!(flat);
                assert!(threshold.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
