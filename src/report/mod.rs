//! Aggregations over the combined results table.
//!
//! Every chart starts from one of these group-by summaries. Each one checks the
//! columns it needs up front and fails with a missing-column error otherwise.
//! Group keys are kept in `BTreeMap`s so tests and source files always come out
//! in lexicographic order.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{CombinedTable, FLAKY_COLUMN, Ordering, SOURCE_FILE_COLUMN, TEST_NAME_COLUMN};
use crate::error::AppError;

pub mod format;

pub use format::*;

/// Sum of one count column per (test, source file).
#[derive(Debug, Clone)]
pub struct MetricByTest {
    pub column: String,
    pub tests: Vec<String>,
    pub sources: Vec<String>,
    /// Keyed by `(test, source)`; only pairs present in the table.
    pub totals: BTreeMap<(String, String), f64>,
}

impl MetricByTest {
    pub fn get(&self, test: &str, source: &str) -> f64 {
        self.totals
            .get(&(test.to_string(), source.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutcomeCounts {
    pub passed: f64,
    pub failed: f64,
}

/// Passed/failed sums for one ordering per (test, source file).
#[derive(Debug, Clone)]
pub struct OutcomesByTest {
    pub ordering: Ordering,
    pub tests: Vec<String>,
    pub sources: Vec<String>,
    /// Keyed by `(test, source)`; only pairs present in the table.
    pub cells: BTreeMap<(String, String), OutcomeCounts>,
}

impl OutcomesByTest {
    /// Counts for a pair; absent pairs read as zero.
    pub fn get(&self, test: &str, source: &str) -> OutcomeCounts {
        self.cells
            .get(&(test.to_string(), source.to_string()))
            .copied()
            .unwrap_or_default()
    }
}

/// Row counts per (source file, flakiness classification).
#[derive(Debug, Clone)]
pub struct FlakinessCounts {
    pub sources: Vec<String>,
    pub categories: Vec<String>,
    pub counts: BTreeMap<(String, String), usize>,
}

impl FlakinessCounts {
    pub fn get(&self, source: &str, category: &str) -> usize {
        self.counts
            .get(&(source.to_string(), category.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Classifications present for one source, in category order.
    pub fn for_source(&self, source: &str) -> Vec<(&str, usize)> {
        self.counts
            .iter()
            .filter(|((src, _), _)| src == source)
            .map(|((_, category), &n)| (category.as_str(), n))
            .collect()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Sum `column` per (`Test_name`, `source_file`).
pub fn metric_by_test(table: &CombinedTable, column: &str) -> Result<MetricByTest, AppError> {
    table.require_columns(&[TEST_NAME_COLUMN, column, SOURCE_FILE_COLUMN])?;

    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for record in table.records() {
        let test = record.test_name();
        if test.is_empty() {
            continue;
        }
        let value = record.count(column)?.unwrap_or(0.0);
        *totals
            .entry((test.to_string(), record.source_file.clone()))
            .or_insert(0.0) += value;
    }

    let (tests, sources) = tests_and_sources(totals.keys());
    tracing::debug!(column, groups = totals.len(), "aggregated metric by test");

    Ok(MetricByTest {
        column: column.to_string(),
        tests,
        sources,
        totals,
    })
}

/// Sum `Passed_<order>` and `Failed_<order>` per (`Test_name`, `source_file`).
pub fn outcomes_by_test(table: &CombinedTable, ordering: Ordering) -> Result<OutcomesByTest, AppError> {
    let pass_col = ordering.passed_column();
    let fail_col = ordering.failed_column();
    table.require_columns(&[TEST_NAME_COLUMN, SOURCE_FILE_COLUMN, pass_col.as_str(), fail_col.as_str()])?;

    let mut cells: BTreeMap<(String, String), OutcomeCounts> = BTreeMap::new();
    for record in table.records() {
        let test = record.test_name();
        if test.is_empty() {
            continue;
        }
        let passed = record.count(&pass_col)?.unwrap_or(0.0);
        let failed = record.count(&fail_col)?.unwrap_or(0.0);
        let cell = cells
            .entry((test.to_string(), record.source_file.clone()))
            .or_default();
        cell.passed += passed;
        cell.failed += failed;
    }

    let (tests, sources) = tests_and_sources(cells.keys());
    tracing::debug!(order = ordering.suffix(), groups = cells.len(), "aggregated outcomes by test");

    Ok(OutcomesByTest {
        ordering,
        tests,
        sources,
        cells,
    })
}

/// Count rows per (`source_file`, `flaky?`). Rows with an empty classification
/// are not counted.
pub fn flakiness_counts(table: &CombinedTable) -> Result<FlakinessCounts, AppError> {
    table.require_columns(&[SOURCE_FILE_COLUMN, FLAKY_COLUMN])?;

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for record in table.records() {
        if record.classification.is_empty() {
            continue;
        }
        *counts
            .entry((record.source_file.clone(), record.classification.clone()))
            .or_insert(0) += 1;
    }

    let (sources, categories) = split_keys(counts.keys());
    Ok(FlakinessCounts {
        sources,
        categories,
        counts,
    })
}

/// Tests in sorted order; source files in the order they first appear when
/// walking the sorted `(test, source)` keys.
fn tests_and_sources<'a>(keys: impl Iterator<Item = &'a (String, String)>) -> (Vec<String>, Vec<String>) {
    let mut tests: Vec<String> = Vec::new();
    let mut sources: Vec<String> = Vec::new();
    for (test, source) in keys {
        if tests.last() != Some(test) {
            tests.push(test.clone());
        }
        if !sources.contains(source) {
            sources.push(source.clone());
        }
    }
    (tests, sources)
}

/// Distinct first and second key components, each sorted.
fn split_keys<'a>(keys: impl Iterator<Item = &'a (String, String)>) -> (Vec<String>, Vec<String>) {
    let mut first = BTreeSet::new();
    let mut second = BTreeSet::new();
    for (a, b) in keys {
        first.insert(a.clone());
        second.insert(b.clone());
    }
    (first.into_iter().collect(), second.into_iter().collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::RunRecord;
    use std::collections::{BTreeSet, HashMap};

    pub(crate) fn row(source: &str, test: &str, flaky: &str, counts: &[(&str, &str)]) -> RunRecord {
        let mut fields: HashMap<String, String> = counts
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        fields.insert(TEST_NAME_COLUMN.to_string(), test.to_string());
        fields.insert(FLAKY_COLUMN.to_string(), flaky.to_string());
        fields.insert("Project_Name".to_string(), "avwx-engine".to_string());
        RunRecord {
            source_file: source.to_string(),
            line: 2,
            project: "avwx-engine".to_string(),
            classification: flaky.to_string(),
            fields,
        }
    }

    pub(crate) fn sample_table() -> CombinedTable {
        let counts = |p: &'static str, f: &'static str, rp: &'static str, rf: &'static str| {
            vec![
                ("Passed_sameOrder", p),
                ("Failed_sameOrder", f),
                ("Passed_randomOrder", rp),
                ("Failed_randomOrder", rf),
            ]
        };
        let records = vec![
            row("results/b.csv", "test_x", "OD", &counts("3", "1", "2", "2")),
            row("results/a.csv", "test_x", "OD", &counts("4", "0", "1", "3")),
            row("results/a.csv", "test_x", "NOD", &counts("1", "1", "", "1")),
            row("results/a.csv", "test_y", "NOD", &counts("5", "5", "5", "5")),
        ];
        let columns: BTreeSet<String> = [
            "Project_Name",
            "Test_name",
            "flaky?",
            "Passed_sameOrder",
            "Failed_sameOrder",
            "Passed_randomOrder",
            "Failed_randomOrder",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();
        CombinedTable::new(records, columns, Vec::new())
    }

    #[test]
    fn metric_sums_per_test_and_source() {
        let agg = metric_by_test(&sample_table(), "Passed_sameOrder").unwrap();
        assert_eq!(agg.tests, vec!["test_x", "test_y"]);
        assert_eq!(agg.sources, vec!["results/a.csv", "results/b.csv"]);
        assert_eq!(agg.get("test_x", "results/a.csv"), 5.0);
        assert_eq!(agg.get("test_x", "results/b.csv"), 3.0);
        assert_eq!(agg.get("test_y", "results/b.csv"), 0.0);
        assert_eq!(agg.totals.len(), 3);
    }

    #[test]
    fn sources_follow_first_appearance_by_test() {
        let pair = |p: &'static str| vec![("Passed_sameOrder", p), ("Failed_sameOrder", "0")];
        let records = vec![
            row("results/a.csv", "test_b", "OD", &pair("1")),
            row("results/z.csv", "test_a", "OD", &pair("2")),
            row("results/a.csv", "test_a", "OD", &pair("3")),
        ];
        let columns: BTreeSet<String> = ["Test_name", "flaky?", "Passed_sameOrder", "Failed_sameOrder"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let table = CombinedTable::new(records, columns, Vec::new());

        let agg = outcomes_by_test(&table, Ordering::SameOrder).unwrap();
        assert_eq!(agg.tests, vec!["test_a", "test_b"]);
        assert_eq!(agg.sources, vec!["results/a.csv", "results/z.csv"]);

        // Without a.csv's test_a row, z.csv is the first source seen.
        let records = table
            .records()
            .iter()
            .filter(|r| !(r.source_file == "results/a.csv" && r.test_name() == "test_a"))
            .cloned()
            .collect();
        let table = CombinedTable::new(records, table.columns().map(str::to_string).collect(), Vec::new());
        let agg = metric_by_test(&table, "Passed_sameOrder").unwrap();
        assert_eq!(agg.sources, vec!["results/z.csv", "results/a.csv"]);
    }

    #[test]
    fn metric_missing_column_fails() {
        let err = metric_by_test(&sample_table(), "Skipped_sameOrder").unwrap_err();
        assert_eq!(err.exit_code(), AppError::INPUT);
        assert!(err.message().contains("Skipped_sameOrder"));
    }

    #[test]
    fn outcomes_treat_empty_cells_as_zero() {
        let agg = outcomes_by_test(&sample_table(), Ordering::RandomOrder).unwrap();
        assert_eq!(
            agg.get("test_x", "results/a.csv"),
            OutcomeCounts {
                passed: 1.0,
                failed: 4.0
            }
        );
        assert_eq!(agg.get("test_y", "results/b.csv"), OutcomeCounts::default());
    }

    #[test]
    fn na_cells_sum_as_zero() {
        let records = vec![row(
            "results/a.csv",
            "t1",
            "OD",
            &[("Passed_sameOrder", "NA"), ("Failed_sameOrder", "0")],
        )];
        let columns: BTreeSet<String> = ["Test_name", "flaky?", "Passed_sameOrder", "Failed_sameOrder"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let table = CombinedTable::new(records, columns, Vec::new());

        let agg = outcomes_by_test(&table, Ordering::SameOrder).unwrap();
        assert_eq!(agg.get("t1", "results/a.csv"), OutcomeCounts::default());
    }

    #[test]
    fn outcomes_require_both_columns() {
        let base = sample_table();
        let columns: BTreeSet<String> = base
            .columns()
            .filter(|c| *c != "Failed_sameOrder")
            .map(str::to_string)
            .collect();
        let table = CombinedTable::new(base.records().to_vec(), columns, Vec::new());

        let err = outcomes_by_test(&table, Ordering::SameOrder).unwrap_err();
        assert!(err.message().contains("Failed_sameOrder"));
        assert!(outcomes_by_test(&table, Ordering::RandomOrder).is_ok());
    }

    #[test]
    fn flakiness_counts_per_source() {
        let counts = flakiness_counts(&sample_table()).unwrap();
        assert_eq!(counts.categories, vec!["NOD", "OD"]);
        assert_eq!(counts.get("results/a.csv", "NOD"), 2);
        assert_eq!(counts.get("results/b.csv", "NOD"), 0);
        assert_eq!(counts.for_source("results/a.csv"), vec![("NOD", 2), ("OD", 1)]);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn flakiness_counts_need_classification_column() {
        let err = flakiness_counts(&CombinedTable::default()).unwrap_err();
        assert!(err.message().contains("flaky?"));
    }
}
