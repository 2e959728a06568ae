use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub run_id: String,
    pub command: String,
    pub version: String,
    pub timestamp: String,
    /// "success" or "failure"
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub inputs: Vec<ManifestInput>,
    pub outputs: Vec<String>,
    pub params: Vec<Param>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ManifestInput {
    pub path: String,
    /// SHA-256 of file inputs; directories are not hashed.
    pub hash: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

/// What a finished command leaves behind for its manifest.
pub struct RunRecord<'a> {
    pub command: &'a str,
    pub inputs: &'a [PathBuf],
    pub outputs: &'a [PathBuf],
    pub params: &'a [(&'a str, String)],
    pub status: &'a str,
    pub duration_ms: Option<u64>,
}

pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).with_context(|| format!("hashing {}", path.display()))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Write `run-<uuid>.json` into `dir` and return its path.
pub fn record_manifest(dir: &Path, run: &RunRecord<'_>) -> Result<PathBuf> {
    let run_id = Uuid::new_v4().to_string();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let inputs = run
        .inputs
        .iter()
        .map(|path| {
            let hash = if path.is_file() {
                Some(hash_file(path)?)
            } else {
                None
            };
            Ok(ManifestInput {
                path: path.display().to_string(),
                hash,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let manifest = ManifestEntry {
        run_id: run_id.clone(),
        command: run.command.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        status: run.status.to_string(),
        duration_ms: run.duration_ms,
        inputs,
        outputs: run
            .outputs
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
        params: run
            .params
            .iter()
            .map(|(k, v)| Param {
                name: k.to_string(),
                value: v.clone(),
            })
            .collect(),
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    let path = dir.join(format!("run-{}.json", run_id));
    fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn read_manifest(path: &Path) -> Result<ManifestEntry> {
    let json =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let manifest = serde_json::from_str(&json)
        .with_context(|| format!("parsing run manifest {}", path.display()))?;
    Ok(manifest)
}
