use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, Result, WrapErr};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// File name of the persisted result list, written to the scanned root.
pub const ARTIFACT_NAME: &str = "unused.json";

/// A confirmed-unused file with its raw size, as collected during the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// One line of the persisted artifact. The size is human-formatted; the raw
/// byte count only exists before `finalize` runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedRecord {
    pub path: PathBuf,
    pub size: String,
}

pub fn artifact_path(root: &Path) -> PathBuf {
    root.join(ARTIFACT_NAME)
}

/// Order the collected files for display and compute the grand total.
///
/// Sorting happens on raw sizes, largest first, with the path as tie-break so
/// repeated runs over an unchanged tree produce byte-identical artifacts. The
/// total is summed before any formatting.
pub fn finalize(mut files: Vec<UnusedFile>) -> (Vec<UnusedRecord>, u64) {
    files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));

    let total: u64 = files.iter().map(|file| file.size).sum();
    let records = files
        .into_iter()
        .map(|file| UnusedRecord {
            path: file.path,
            size: format_size(file.size),
        })
        .collect();

    (records, total)
}

/// Format a byte count the way the result list displays it: `b` below 1024,
/// then two-decimal `Kb`, `M`, `G`.
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2}G", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2}M", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2}Kb", size as f64 / KB as f64)
    } else {
        format!("{size}b")
    }
}

/// Write the result list to `<root>/unused.json` and return its path.
pub async fn write_artifact(root: &Path, records: &[UnusedRecord]) -> Result<PathBuf> {
    let path = artifact_path(root);
    let contents = serde_json::to_string_pretty(records)?;
    tokio::fs::write(&path, contents)
        .await
        .wrap_err_with(|| format!("could not write result list to {}", path.display()))?;

    Ok(path)
}

/// Read a previously written result list back.
pub async fn read_artifact(path: &Path) -> Result<Vec<UnusedRecord>> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            eyre!("no {} found at {}; run a detection first", ARTIFACT_NAME, path.display())
        } else {
            eyre!("could not read {}: {err}", path.display())
        }
    })?;

    serde_json::from_str(&contents)
        .wrap_err_with(|| format!("{} is not a valid result list", path.display()))
}

/// Delete every file listed in the artifact, then the artifact itself.
///
/// A no-op returning 0 unless `confirmed` is true. Listed paths that no
/// longer exist are skipped silently; any other removal error aborts. Returns
/// the number of files actually removed.
pub async fn apply_deletions(artifact: &Path, confirmed: bool) -> Result<usize> {
    let records = read_artifact(artifact).await?;

    if !confirmed {
        return Ok(0);
    }

    let deleted: usize = records
        .par_iter()
        .map(|record| match std::fs::remove_file(&record.path) {
            Ok(()) => Ok(1),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(0),
            Err(err) => Err(eyre!("could not delete {}: {err}", record.path.display())),
        })
        .collect::<Result<Vec<usize>>>()?
        .into_iter()
        .sum();

    tokio::fs::remove_file(artifact)
        .await
        .wrap_err_with(|| format!("could not remove {}", artifact.display()))?;

    Ok(deleted)
}
