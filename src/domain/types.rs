//! Shared domain types.
//!
//! The combined results table is deliberately schema-light: result files differ
//! in which count columns they carry, so a record keeps every column by name and
//! charts ask for the columns they need (failing with a missing-column error when
//! the table does not have them).

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::error::AppError;

pub const PROJECT_COLUMN: &str = "Project_Name";
pub const FLAKY_COLUMN: &str = "flaky?";
pub const TEST_NAME_COLUMN: &str = "Test_name";
/// Synthetic provenance column added to every row at load time.
pub const SOURCE_FILE_COLUMN: &str = "source_file";

/// Classification that is filtered out at load time.
pub const NOT_FLAKY: &str = "not flaky";
pub const DEFAULT_PROJECTS: [&str; 2] = ["flapy_example", "avwx-engine"];

/// Cell values read as missing, in addition to the empty cell.
///
/// Matches the NA markers common CSV tooling (pandas, R) writes and accepts.
pub const MISSING_MARKERS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA",
    "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Test execution ordering under which pass/fail counts were recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ordering {
    SameOrder,
    RandomOrder,
}

impl Ordering {
    /// Column suffix used by the result files (`Passed_sameOrder`, ...).
    pub fn suffix(self) -> &'static str {
        match self {
            Ordering::SameOrder => "sameOrder",
            Ordering::RandomOrder => "randomOrder",
        }
    }

    pub fn column(self, outcome: Outcome) -> String {
        format!("{}_{}", outcome.label(), self.suffix())
    }

    pub fn passed_column(self) -> String {
        self.column(Outcome::Passed)
    }

    pub fn failed_column(self) -> String {
        self.column(Outcome::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Passed => "Passed",
            Outcome::Failed => "Failed",
        }
    }
}

/// Every chart the tool knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ChartKind {
    /// Grouped stacked pass/fail bars per test and source file (same order).
    GroupedSame,
    /// Grouped stacked pass/fail bars per test and source file (random order).
    GroupedRandom,
    /// Flakiness classification counts per source file.
    FlakinessBar,
    /// One flakiness distribution pie per source file.
    FlakinessPie,
    PassedSame,
    PassedRandom,
    FailedSame,
    FailedRandom,
    /// Pass/fail stacked on one bar per (test, source file), same order.
    StackedSame,
    /// Pass/fail stacked on one bar per (test, source file), random order.
    StackedRandom,
}

impl ChartKind {
    pub const ALL: [ChartKind; 10] = [
        ChartKind::GroupedSame,
        ChartKind::GroupedRandom,
        ChartKind::FlakinessBar,
        ChartKind::FlakinessPie,
        ChartKind::PassedSame,
        ChartKind::PassedRandom,
        ChartKind::FailedSame,
        ChartKind::FailedRandom,
        ChartKind::StackedSame,
        ChartKind::StackedRandom,
    ];

    /// Charts rendered when none are requested explicitly.
    pub const DEFAULT: [ChartKind; 4] = [
        ChartKind::GroupedSame,
        ChartKind::GroupedRandom,
        ChartKind::FlakinessBar,
        ChartKind::FlakinessPie,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::GroupedSame => "grouped_same_order.png",
            ChartKind::GroupedRandom => "grouped_random_order.png",
            ChartKind::FlakinessBar => "flakiness_bar_all.png",
            ChartKind::FlakinessPie => "flakiness_pies_all.png",
            ChartKind::PassedSame => "passed_same_plot.png",
            ChartKind::PassedRandom => "passed_random_plot.png",
            ChartKind::FailedSame => "failed_same_plot.png",
            ChartKind::FailedRandom => "failed_random_plot.png",
            ChartKind::StackedSame => "stacked_same_order.png",
            ChartKind::StackedRandom => "stacked_random_order.png",
        }
    }
}

/// Which rows survive loading.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    pub projects: Vec<String>,
    pub excluded_classification: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            projects: DEFAULT_PROJECTS.iter().map(|p| p.to_string()).collect(),
            excluded_classification: NOT_FLAKY.to_string(),
        }
    }
}

impl FilterConfig {
    pub fn keeps(&self, project: &str, classification: &str) -> bool {
        self.projects.iter().any(|p| p == project) && classification != self.excluded_classification
    }
}

/// A full render run as understood by the pipeline (derived from CLI flags).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub results_dir: PathBuf,
    pub out_dir: PathBuf,
    pub filter: FilterConfig,
    pub charts: Vec<ChartKind>,
    /// Extra per-test bar charts for arbitrary count columns.
    pub metrics: Vec<String>,
    pub export: Option<PathBuf>,
}

/// One test-run row from one result file.
#[derive(Debug, Clone)]
pub struct RunRecord {
    /// Path of the CSV the row came from.
    pub source_file: String,
    /// 1-based CSV line number.
    pub line: usize,
    pub project: String,
    pub classification: String,
    pub fields: HashMap<String, String>,
}

impl RunRecord {
    /// Raw (trimmed) value of a column; `source_file` resolves to the provenance.
    pub fn field(&self, name: &str) -> Option<&str> {
        if name == SOURCE_FILE_COLUMN {
            return Some(&self.source_file);
        }
        self.fields.get(name).map(String::as_str)
    }

    pub fn test_name(&self) -> &str {
        self.field(TEST_NAME_COLUMN).unwrap_or("")
    }

    /// Parse a count column. Empty, NA-marked or absent cells are `None`.
    pub fn count(&self, column: &str) -> Result<Option<f64>, AppError> {
        let Some(raw) = self.field(column).filter(|s| !is_missing(s)) else {
            return Ok(None);
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(AppError::input(format!(
                "Non-numeric value '{raw}' in column `{column}` ({}:{}).",
                self.source_file, self.line
            ))),
        }
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || MISSING_MARKERS.contains(&raw)
}

/// Row errors hit while reading a single file.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest bookkeeping for one result file.
#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub path: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Set when the file lacked the columns needed to filter it.
    pub skipped: Option<String>,
    pub row_errors: Vec<RowError>,
}

/// The combined results table: every kept row of every kept file.
#[derive(Debug, Clone, Default)]
pub struct CombinedTable {
    records: Vec<RunRecord>,
    columns: BTreeSet<String>,
    sources: Vec<SourceSummary>,
}

impl CombinedTable {
    pub fn new(records: Vec<RunRecord>, columns: BTreeSet<String>, sources: Vec<SourceSummary>) -> Self {
        Self {
            records,
            columns,
            sources,
        }
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn sources(&self) -> &[SourceSummary] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names from the kept files' headers (without `source_file`).
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == SOURCE_FILE_COLUMN || self.columns.contains(name)
    }

    pub fn require_columns(&self, names: &[&str]) -> Result<(), AppError> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(name) => Err(AppError::missing_column(name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> RunRecord {
        RunRecord {
            source_file: "results/a.csv".to_string(),
            line: 2,
            project: "flapy_example".to_string(),
            classification: "OD".to_string(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn ordering_columns() {
        assert_eq!(Ordering::SameOrder.passed_column(), "Passed_sameOrder");
        assert_eq!(Ordering::RandomOrder.failed_column(), "Failed_randomOrder");
    }

    #[test]
    fn filter_rejects_not_flaky_and_foreign_projects() {
        let filter = FilterConfig::default();
        assert!(filter.keeps("avwx-engine", "NOD"));
        assert!(!filter.keeps("avwx-engine", "not flaky"));
        assert!(!filter.keeps("requests", "OD"));
    }

    #[test]
    fn count_parses_and_treats_empty_as_missing() {
        let r = record(&[("Passed_sameOrder", "7"), ("Failed_sameOrder", "")]);
        assert_eq!(r.count("Passed_sameOrder").unwrap(), Some(7.0));
        assert_eq!(r.count("Failed_sameOrder").unwrap(), None);
        assert_eq!(r.count("Failed_randomOrder").unwrap(), None);
    }

    #[test]
    fn count_treats_na_markers_as_missing() {
        let r = record(&[
            ("Passed_sameOrder", "NA"),
            ("Failed_sameOrder", "nan"),
            ("Passed_randomOrder", "N/A"),
            ("Failed_randomOrder", "null"),
        ]);
        for column in ["Passed_sameOrder", "Failed_sameOrder", "Passed_randomOrder", "Failed_randomOrder"] {
            assert_eq!(r.count(column).unwrap(), None, "{column}");
        }
    }

    #[test]
    fn count_rejects_text() {
        let r = record(&[("Passed_sameOrder", "lots")]);
        let err = r.count("Passed_sameOrder").unwrap_err();
        assert_eq!(err.exit_code(), AppError::INPUT);
        assert!(err.message().contains("results/a.csv:2"));
    }

    #[test]
    fn source_file_is_always_a_column() {
        let table = CombinedTable::default();
        assert!(table.has_column(SOURCE_FILE_COLUMN));
        let err = table.require_columns(&[SOURCE_FILE_COLUMN, TEST_NAME_COLUMN]).unwrap_err();
        assert!(err.message().contains("Test_name"));
    }
}
