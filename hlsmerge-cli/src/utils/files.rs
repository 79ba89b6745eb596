use std::path::{Path, PathBuf};

use hlsmerge_engine::hls::processor::staged_file_name;

use crate::error::AppError;

/// `total_<name>` where `<name>` is the file name of the first segment URI.
pub fn default_output_path(first_segment_uri: &str) -> Result<PathBuf, AppError> {
    let name = staged_file_name(first_segment_uri).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Cannot derive an output name from '{first_segment_uri}', pass --output"
        ))
    })?;
    Ok(PathBuf::from(format!("total_{name}")))
}

/// Output path without its extension, or `<output>_segments` when it has none.
pub fn default_staging_dir(output: &Path) -> PathBuf {
    if output.extension().is_some() {
        output.with_extension("")
    } else {
        let mut dir = output.as_os_str().to_owned();
        dir.push("_segments");
        PathBuf::from(dir)
    }
}
