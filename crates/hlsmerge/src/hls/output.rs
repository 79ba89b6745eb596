// HLS Output: orders staged segment files and concatenates them into the final file.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::hls::HlsMergeError;
use crate::hls::events::{ProgressPhase, ProgressSink};

/// All ASCII digits of `name` joined left to right, as an unbounded decimal
/// number with leading zeros removed. `None` when the name has no digit.
pub fn numeric_key(name: &str) -> Option<String> {
    let digits: String = name.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    Some(if significant.is_empty() {
        "0".to_string()
    } else {
        significant.to_string()
    })
}

/// Numeric comparison of two keys produced by [`numeric_key`].
pub fn compare_numeric(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sorts file names by their embedded number. Equal numbers fall back to the
/// plain name so the order stays deterministic.
pub fn sort_by_numeric_key(names: Vec<String>) -> Result<Vec<String>, HlsMergeError> {
    let mut keyed = names
        .into_iter()
        .map(|name| match numeric_key(&name) {
            Some(key) => Ok((key, name)),
            None => Err(HlsMergeError::ReassemblyError(format!(
                "Staged file '{name}' has no number to order it by"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    keyed.sort_by(|(ka, na), (kb, nb)| compare_numeric(ka, kb).then_with(|| na.cmp(nb)));
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

/// Result of a combine pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineSummary {
    pub files: usize,
    pub bytes: u64,
}

pub struct Reassembler {
    progress: Arc<dyn ProgressSink>,
}

impl Reassembler {
    pub fn new(progress: Arc<dyn ProgressSink>) -> Self {
        Self { progress }
    }

    async fn list_staged(staging_dir: &Path) -> Result<Vec<String>, HlsMergeError> {
        let mut entries = fs::read_dir(staging_dir).await.map_err(|e| {
            HlsMergeError::ReassemblyError(format!(
                "Failed to list staging directory {}: {e}",
                staging_dir.display()
            ))
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            HlsMergeError::ReassemblyError(format!(
                "Failed to list staging directory {}: {e}",
                staging_dir.display()
            ))
        })? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                debug!(path = %entry.path().display(), "Skipping directory in staging area");
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => {
                    return Err(HlsMergeError::ReassemblyError(format!(
                        "Staged file name {raw:?} is not valid UTF-8"
                    )));
                }
            }
        }
        Ok(names)
    }

    /// Concatenates every staged file in numeric order into `output_path`,
    /// creating or truncating it.
    pub async fn combine(
        &self,
        staging_dir: &Path,
        output_path: &Path,
    ) -> Result<CombineSummary, HlsMergeError> {
        let ordered = sort_by_numeric_key(Self::list_staged(staging_dir).await?)?;
        info!(files = ordered.len(), output = %output_path.display(), "Combining staged segments");

        let output = File::create(output_path).await.map_err(|e| {
            HlsMergeError::ReassemblyError(format!(
                "Failed to create output file {}: {e}",
                output_path.display()
            ))
        })?;
        let mut writer = BufWriter::new(output);

        self.progress.begin(ProgressPhase::Combine, ordered.len() as u64);
        let mut bytes = 0;
        for name in &ordered {
            let path: PathBuf = staging_dir.join(name);
            let mut input = File::open(&path).await.map_err(|e| {
                HlsMergeError::ReassemblyError(format!("Failed to open {}: {e}", path.display()))
            })?;
            bytes += tokio::io::copy(&mut input, &mut writer).await.map_err(|e| {
                HlsMergeError::ReassemblyError(format!("Failed to copy {}: {e}", path.display()))
            })?;
            self.progress.increment(ProgressPhase::Combine);
        }

        writer.flush().await.map_err(|e| {
            HlsMergeError::ReassemblyError(format!(
                "Failed to flush output file {}: {e}",
                output_path.display()
            ))
        })?;
        self.progress.finish(ProgressPhase::Combine);

        Ok(CombineSummary {
            files: ordered.len(),
            bytes,
        })
    }
}
