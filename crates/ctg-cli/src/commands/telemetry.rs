use std::path::{Path, PathBuf};
use std::time::Instant;

use ctg_cli::manifest::{record_manifest, RunRecord};
use tracing::{info, warn};

/// Record `run-<uuid>.json` in `dir`; a manifest that cannot be written never
/// fails the command itself.
pub fn record_run_timed<T>(
    dir: &Path,
    command: &str,
    inputs: &[PathBuf],
    outputs: &[PathBuf],
    params: &[(&str, String)],
    start: Instant,
    result: &anyhow::Result<T>,
) {
    let status = if result.is_ok() { "success" } else { "failure" };
    let run = RunRecord {
        command,
        inputs,
        outputs,
        params,
        status,
        duration_ms: Some(start.elapsed().as_millis() as u64),
    };
    match record_manifest(dir, &run) {
        Ok(path) => info!("recorded run manifest {}", path.display()),
        Err(err) => warn!("failed to record run manifest: {err:#}"),
    }
}

/// Directory a run manifest goes in: beside the output file.
pub fn manifest_dir(output: &Path) -> PathBuf {
    output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf()
}
