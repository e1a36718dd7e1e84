//! CSV ingest and filtering.
//!
//! This module turns a directory's worth of flaky-test result files into one
//! `CombinedTable`:
//!
//! - headers are trimmed (and a UTF-8 BOM stripped) before lookup
//! - files without `Project_Name` / `flaky?` are skipped, not fatal
//! - rows outside the allowed projects, or classified `not flaky`, are dropped
//! - CSV-level row errors are collected per file and reported, never repaired

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{
    CombinedTable, FLAKY_COLUMN, FilterConfig, PROJECT_COLUMN, RowError, RunRecord, SOURCE_FILE_COLUMN,
    SourceSummary,
};
use crate::error::AppError;

/// Rows and header names read from one result file.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub summary: SourceSummary,
    pub records: Vec<RunRecord>,
    pub columns: Vec<String>,
}

impl LoadedFile {
    pub fn is_skipped(&self) -> bool {
        self.summary.skipped.is_some()
    }
}

/// Read a single result file and apply the load-time filter.
pub fn load_results_file(path: &Path, filter: &FilterConfig) -> Result<LoadedFile, AppError> {
    let source = path.display().to_string();
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{source}': {e}")))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers of '{source}': {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let columns: Vec<String> = headers.iter().map(normalize_header_name).collect();

    let mut summary = SourceSummary {
        path: source.clone(),
        rows_read: 0,
        rows_kept: 0,
        skipped: None,
        row_errors: Vec::new(),
    };

    if let Some(reason) = missing_filter_columns(&header_map) {
        tracing::warn!(file = %source, "skipping result file: {reason}");
        summary.skipped = Some(reason);
        return Ok(LoadedFile {
            summary,
            records: Vec::new(),
            columns,
        });
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        summary.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(file = %source, line, "{e}");
                summary.row_errors.push(RowError {
                    line,
                    message: e.to_string(),
                });
                continue;
            }
        };

        let row = to_run_record(&record, &header_map, &source, line);
        if filter.keeps(&row.project, &row.classification) {
            records.push(row);
        }
    }

    summary.rows_kept = records.len();
    tracing::info!(
        file = %source,
        rows_read = summary.rows_read,
        rows_kept = summary.rows_kept,
        "loaded result file"
    );

    Ok(LoadedFile {
        summary,
        records,
        columns,
    })
}

/// Load every file and concatenate the kept rows into one table.
///
/// Fails when no file carries the columns needed for filtering: there is
/// nothing to combine in that case.
pub fn load_combined(files: &[impl AsRef<Path>], filter: &FilterConfig) -> Result<CombinedTable, AppError> {
    let mut records = Vec::new();
    let mut columns = BTreeSet::new();
    let mut sources = Vec::with_capacity(files.len());
    let mut kept_files = 0usize;

    for path in files {
        let loaded = load_results_file(path.as_ref(), filter)?;
        if !loaded.is_skipped() {
            kept_files += 1;
            // `source_file` is always the provenance column, never a file's own.
            columns.extend(
                loaded
                    .columns
                    .into_iter()
                    .filter(|c| !c.is_empty() && c != SOURCE_FILE_COLUMN),
            );
            records.extend(loaded.records);
        }
        sources.push(loaded.summary);
    }

    if kept_files == 0 {
        return Err(AppError::no_data(format!(
            "No result files with `{PROJECT_COLUMN}` and `{FLAKY_COLUMN}` columns to combine ({} file(s) inspected).",
            files.len()
        )));
    }

    Ok(CombinedTable::new(records, columns, sources))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // First occurrence wins for duplicated headers.
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn missing_filter_columns(header_map: &HashMap<String, usize>) -> Option<String> {
    let missing: Vec<&str> = [PROJECT_COLUMN, FLAKY_COLUMN]
        .into_iter()
        .filter(|name| !header_map.contains_key(*name))
        .collect();
    if missing.is_empty() {
        return None;
    }
    let names: Vec<String> = missing.iter().map(|n| format!("`{n}`")).collect();
    Some(format!("missing column(s) {}", names.join(", ")))
}

fn to_run_record(record: &StringRecord, header_map: &HashMap<String, usize>, source: &str, line: usize) -> RunRecord {
    let fields: HashMap<String, String> = header_map
        .iter()
        .filter(|(name, _)| !name.is_empty() && name.as_str() != SOURCE_FILE_COLUMN)
        .filter_map(|(name, &idx)| record.get(idx).map(|v| (name.clone(), v.to_string())))
        .collect();

    let project = fields.get(PROJECT_COLUMN).cloned().unwrap_or_default();
    let classification = fields.get(FLAKY_COLUMN).cloned().unwrap_or_default();

    RunRecord {
        source_file: source.to_string(),
        line,
        project,
        classification,
        fields,
    }
}
