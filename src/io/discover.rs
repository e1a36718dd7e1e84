//! Result file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// List the `*.csv` files directly inside `dir`, sorted by path.
///
/// Sorting keeps the combined table (and every chart built from it)
/// independent of directory iteration order.
pub fn discover_result_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::input(format!("Failed to read results directory '{}': {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::input(format!("Failed to read entry in '{}': {e}", dir.display()))
        })?;
        let path = entry.path();
        if path.is_file() && has_csv_extension(&path) {
            files.push(path);
        }
    }

    files.sort();
    tracing::debug!(dir = %dir.display(), count = files.len(), "discovered result files");
    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
