//! Export the combined results table to CSV.
//!
//! The export is the table every chart is built from, so it is a convenient
//! starting point for spreadsheets or ad-hoc scripts.

use std::path::Path;

use crate::domain::{CombinedTable, SOURCE_FILE_COLUMN};
use crate::error::AppError;

/// Write the combined table: union of columns in name order, `source_file` last.
pub fn write_combined_csv(path: &Path, table: &CombinedTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::output(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let mut header: Vec<&str> = table.columns().collect();
    header.push(SOURCE_FILE_COLUMN);

    writer
        .write_record(&header)
        .map_err(|e| AppError::output(format!("Failed to write export CSV header: {e}")))?;

    for record in table.records() {
        let row = header.iter().map(|name| record.field(name).unwrap_or(""));
        writer
            .write_record(row)
            .map_err(|e| AppError::output(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::output(format!("Failed to flush export CSV '{}': {e}", path.display())))?;

    tracing::info!(path = %path.display(), rows = table.len(), "exported combined table");
    Ok(())
}
