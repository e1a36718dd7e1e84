//! Formatted terminal output for an ingest run.
//!
//! Kept separate from the aggregations so output changes stay localized.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{CombinedTable, SourceSummary};
use crate::error::AppError;

/// Serializable view of a loaded table (for `summary --json`).
#[derive(Debug, Serialize)]
pub struct IngestSummary<'a> {
    pub rows: usize,
    pub columns: Vec<&'a str>,
    pub projects: BTreeMap<&'a str, usize>,
    pub classifications: BTreeMap<&'a str, usize>,
    pub sources: &'a [SourceSummary],
}

impl<'a> IngestSummary<'a> {
    pub fn from_table(table: &'a CombinedTable) -> Self {
        let mut projects = BTreeMap::new();
        let mut classifications = BTreeMap::new();
        for record in table.records() {
            *projects.entry(record.project.as_str()).or_insert(0) += 1;
            *classifications.entry(record.classification.as_str()).or_insert(0) += 1;
        }
        Self {
            rows: table.len(),
            columns: table.columns().collect(),
            projects,
            classifications,
            sources: table.sources(),
        }
    }
}

/// Format the per-file ingest table plus project/classification breakdowns.
pub fn format_ingest_summary(table: &CombinedTable) -> String {
    let summary = IngestSummary::from_table(table);
    let mut out = String::new();

    out.push_str("=== flaky-charts - combined results ===\n");
    out.push_str(&format!(
        "Files: {} ({} skipped) | Rows kept: {}\n",
        summary.sources.len(),
        summary.sources.iter().filter(|s| s.skipped.is_some()).count(),
        summary.rows,
    ));

    out.push('\n');
    out.push_str(&format_sources(summary.sources));

    if !summary.projects.is_empty() {
        out.push_str("\nProjects:\n");
        for (project, n) in &summary.projects {
            out.push_str(&format!("  {project:<24} {n:>6}\n"));
        }
    }

    if !summary.classifications.is_empty() {
        out.push_str("\nFlakiness:\n");
        for (category, n) in &summary.classifications {
            let label = if category.is_empty() { "(blank)" } else { *category };
            out.push_str(&format!("  {label:<24} {n:>6}\n"));
        }
    }

    let errors: Vec<_> = summary
        .sources
        .iter()
        .flat_map(|s| s.row_errors.iter().map(move |e| (s.path.as_str(), e)))
        .collect();
    if !errors.is_empty() {
        out.push_str("\nRow errors:\n");
        for (path, err) in errors {
            out.push_str(&format!("  {path}:{} {}\n", err.line, err.message));
        }
    }

    out
}

pub fn format_summary_json(table: &CombinedTable) -> Result<String, AppError> {
    serde_json::to_string_pretty(&IngestSummary::from_table(table))
        .map_err(|e| AppError::output(format!("Failed to serialize summary: {e}")))
}

fn format_sources(sources: &[SourceSummary]) -> String {
    let mut out = String::new();
    out.push_str(
        format!("{:<40} {:>8} {:>8} {:>7} {:<30}\n", "file", "read", "kept", "errors", "note").trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<40} {:-<8} {:-<8} {:-<7} {:-<30}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for s in sources {
        out.push_str(
            format!(
                "{:<40} {:>8} {:>8} {:>7} {:<30}\n",
                truncate(&s.path, 40),
                s.rows_read,
                s.rows_kept,
                s.row_errors.len(),
                s.skipped.as_deref().map(|r| format!("skipped: {r}")).unwrap_or_default(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Shorten `s` to at most `max` characters, marking the cut with `.`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowError;
    use crate::report::tests::sample_table;

    fn table_with_sources() -> CombinedTable {
        let base = sample_table();
        let sources = vec![
            SourceSummary {
                path: "results/a.csv".to_string(),
                rows_read: 5,
                rows_kept: 3,
                skipped: None,
                row_errors: vec![RowError {
                    line: 4,
                    message: "CSV parse error: bad quote".to_string(),
                }],
            },
            SourceSummary {
                path: "results/notes.csv".to_string(),
                rows_read: 0,
                rows_kept: 0,
                skipped: Some("missing column(s) `flaky?`".to_string()),
                row_errors: Vec::new(),
            },
        ];
        CombinedTable::new(
            base.records().to_vec(),
            base.columns().map(str::to_string).collect(),
            sources,
        )
    }

    #[test]
    fn summary_lists_files_breakdowns_and_errors() {
        let text = format_ingest_summary(&table_with_sources());
        assert!(text.contains("Files: 2 (1 skipped) | Rows kept: 4"));
        assert!(text.contains("skipped: missing column(s) `flaky?`"));
        assert!(text.contains("avwx-engine"));
        assert!(text.contains("results/a.csv:4 CSV parse error: bad quote"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("NOD") && l.ends_with('2')));
    }

    #[test]
    fn json_summary_round_trips_counts() {
        let json = format_summary_json(&table_with_sources()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rows"], 4);
        assert_eq!(value["classifications"]["OD"], 2);
        assert_eq!(value["sources"][1]["skipped"], "missing column(s) `flaky?`");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("test_something_long", 8), "test_so.");
    }
}
