//! Writing artifacts to disk.

use crate::error::ExportError;
use riskdash_domain::enums::ExportFormat;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `simulation_{id}.{ext}`, the name the backend suggests for its exports.
#[must_use]
pub fn download_filename(simulation_id: impl Display, format: ExportFormat) -> String {
    format!("simulation_{simulation_id}.{}", format.extension())
}

/// Writes `bytes` to `dir/filename`, creating `dir` if needed.
///
/// Only the final path component of `filename` is used.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn save_download(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| {
            ExportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid file name: {filename}"),
            ))
        })?;
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    info!(path = %path.display(), bytes = bytes.len(), "Export saved");
    Ok(path)
}
