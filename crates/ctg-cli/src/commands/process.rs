use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use ctg_batch::{
    process_cases, CaseDiscovery, FolderDiscovery, ProcessOptions, SidecarCsvExporter,
};
use tabwriter::TabWriter;
use tracing::warn;

use crate::commands::telemetry::{manifest_dir, record_run_timed};
use crate::commands::util::parse_threads;

/// Case files named directly, plus those discovered in named folders.
pub fn collect_cases(args: &[PathBuf], discovery: &dyn CaseDiscovery) -> Result<Vec<PathBuf>> {
    let mut cases = Vec::new();
    for arg in args {
        if !arg.is_dir() {
            cases.push(arg.clone());
            continue;
        }
        let found = discovery.discover(arg)?;
        for (case_type, path) in &found.duplicates {
            warn!(
                case_type = %case_type,
                "skipping duplicate case file {}",
                path.display()
            );
        }
        for path in &found.unmatched {
            warn!("no case type matches {}", path.display());
        }
        if found.is_empty() {
            warn!("no case files found in {}", arg.display());
        }
        cases.extend(found.files());
    }
    Ok(cases)
}

pub fn handle(args: &[PathBuf], options: ProcessOptions, threads: &str) -> Result<()> {
    let start = Instant::now();
    let mut outputs = Vec::new();
    let params = vec![
        ("dedup", options.filter.dedup_by_issue.to_string()),
        ("delete_original", options.delete_original.to_string()),
        ("threads", threads.to_string()),
    ];
    let res = (|| -> Result<()> {
        let threads = parse_threads(threads)?;
        let cases = collect_cases(args, &FolderDiscovery)?;
        if cases.is_empty() {
            return Err(anyhow!("no case files to process"));
        }
        let outcomes = process_cases(&cases, &SidecarCsvExporter, &options, threads)?;

        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "CASE\tTYPE\tSTATUS\tROWS\tOUTPUT")?;
        for outcome in &outcomes {
            let case_type = outcome
                .case_type
                .map(|ct| ct.to_string())
                .unwrap_or_else(|| "Other".to_string());
            let (rows, detail) = match (&outcome.processed, &outcome.error) {
                (Some(done), _) => {
                    outputs.push(done.filtered.clone());
                    (
                        format!("{} -> {}", done.report.input_rows, done.report.output_rows),
                        done.filtered.display().to_string(),
                    )
                }
                (None, error) => (String::new(), error.clone().unwrap_or_default()),
            };
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                outcome.case_file.display(),
                case_type,
                outcome.status,
                rows,
                detail
            )?;
        }
        writer.flush()?;

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        if failed > 0 {
            return Err(anyhow!("{failed} of {} cases failed", outcomes.len()));
        }
        Ok(())
    })();

    let dir = args
        .first()
        .map(|first| {
            if first.is_dir() {
                first.clone()
            } else {
                manifest_dir(first)
            }
        })
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    record_run_timed(&dir, "process", args, &outputs, &params, start, &res);
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn folders_expand_to_discovered_cases() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("S_DCwACver_P1-7.pwb"), "").unwrap();
        fs::write(dir.path().join("S_ACCA_LongTerm.pwb"), "").unwrap();
        let direct = PathBuf::from("/elsewhere/T_ACCA_P1,2,4,7.pwb");

        let cases =
            collect_cases(&[direct.clone(), dir.path().to_path_buf()], &FolderDiscovery).unwrap();
        assert_eq!(
            cases,
            vec![
                direct,
                dir.path().join("S_ACCA_LongTerm.pwb"),
                dir.path().join("S_DCwACver_P1-7.pwb"),
            ]
        );
    }
}
