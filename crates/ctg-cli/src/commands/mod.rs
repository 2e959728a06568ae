use anyhow::Result;
use ctg_algo::ScenarioParser;
use ctg_cli::cli::Commands;
use ctg_cli::config::CtgConfig;

use crate::commands::compare::CompareArgs;
use crate::commands::util::parse_list;

pub mod batch;
pub mod compare;
pub mod completions;
pub mod filter;
pub mod output;
pub mod parse;
pub mod process;
pub mod sheets;
pub mod telemetry;
pub mod trends;
pub mod util;

/// Run one subcommand; flags given on the command line win over `config`.
pub fn dispatch(command: &Commands, config: &CtgConfig) -> Result<()> {
    let parser = ScenarioParser::new(config.parser_options());
    match command {
        Commands::Sheets { workbook, all } => sheets::handle(workbook, *all, &parser),
        Commands::Parse {
            workbook,
            sheet,
            out,
            format,
            diagnostics,
        } => parse::handle(
            workbook,
            sheet,
            out.as_deref(),
            *format,
            *diagnostics,
            &parser,
        ),
        Commands::Compare {
            workbook,
            left,
            right,
            threshold,
            case_type,
            flat,
            out,
            format,
        } => {
            let args = CompareArgs {
                workbook: workbook.as_path(),
                threshold: threshold.unwrap_or(config.compare.threshold),
                case_type: *case_type,
                expandable: !flat && config.compare.expandable,
                out: out.as_deref(),
                format: *format,
            };
            compare::handle_pair(&args, left, right, &parser)
        }
        Commands::Straight {
            workbook,
            sheets,
            threshold,
            case_type,
            flat,
            title,
            out,
            format,
        } => {
            let args = CompareArgs {
                workbook: workbook.as_path(),
                threshold: threshold.unwrap_or(config.compare.threshold),
                case_type: *case_type,
                expandable: !flat && config.compare.expandable,
                out: out.as_deref(),
                format: *format,
            };
            compare::handle_straight(&args, &parse_list(sheets.as_deref()), title, &parser)
        }
        Commands::Trends {
            workbook,
            case_type,
            min_percent,
            sheets,
            json,
        } => trends::handle(
            workbook,
            *case_type,
            *min_percent,
            &parse_list(sheets.as_deref()),
            *json,
            &parser,
        ),
        Commands::Batch {
            plan,
            workbook,
            out,
            threads,
        } => batch::handle(plan, workbook.as_deref(), out, threads, &parser),
        Commands::Filter {
            input,
            categories,
            dedup,
            out,
        } => {
            let mut filter = config.filter.filter_config();
            if let Some(categories) = categories {
                filter.keep_categories = parse_list(Some(categories)).into_iter().collect();
            }
            if *dedup {
                filter.dedup_by_issue = true;
            }
            filter::handle(input, out.as_deref(), filter)
        }
        Commands::Process {
            cases,
            dedup,
            delete_original,
            threads,
        } => {
            let mut options = config.filter.process_options();
            if *dedup {
                options.filter.dedup_by_issue = true;
            }
            if *delete_original {
                options.delete_original = true;
            }
            process::handle(cases, options, threads)
        }
        Commands::Completions { shell, out } => completions::handle(*shell, out.as_deref()),
    }
}
