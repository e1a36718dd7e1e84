//! Shared load-and-render workflow used by the CLI commands.
//!
//! discover -> load + filter -> (export) -> aggregate -> build figure -> render
//!
//! Each chart is independent: it aggregates the combined table on its own and
//! fails on its own when a column it needs is missing.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{ChartKind, CombinedTable, FilterConfig, Ordering, Outcome, RenderConfig};
use crate::error::AppError;
use crate::io::{discover_result_files, load_combined, write_combined_csv};
use crate::plot::{
    flakiness_bar_figure, flakiness_pie_figure, grouped_stacked_figure, metric_figure, render_bar_figure,
    render_pie_figure, stacked_figure,
};
use crate::report::{flakiness_counts, metric_by_test, outcomes_by_test};

/// All outputs of a single render run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub table: CombinedTable,
    pub written: Vec<PathBuf>,
}

/// Discover and load every result file in `results_dir`.
pub fn load_table(results_dir: &Path, filter: &FilterConfig) -> Result<CombinedTable, AppError> {
    let files = discover_result_files(results_dir)?;
    load_combined(&files, filter)
}

/// Render one chart into `out_dir` under its default file name.
pub fn render_chart(table: &CombinedTable, kind: ChartKind, out_dir: &Path) -> Result<PathBuf, AppError> {
    let path = out_dir.join(kind.file_name());

    match kind {
        ChartKind::GroupedSame => render_grouped(table, Ordering::SameOrder, &path)?,
        ChartKind::GroupedRandom => render_grouped(table, Ordering::RandomOrder, &path)?,
        ChartKind::FlakinessBar => render_bar_figure(&flakiness_bar_figure(&flakiness_counts(table)?), &path)?,
        ChartKind::FlakinessPie => render_pie_figure(&flakiness_pie_figure(&flakiness_counts(table)?), &path)?,
        ChartKind::PassedSame => render_metric_to(table, &Ordering::SameOrder.column(Outcome::Passed), &path)?,
        ChartKind::PassedRandom => render_metric_to(table, &Ordering::RandomOrder.column(Outcome::Passed), &path)?,
        ChartKind::FailedSame => render_metric_to(table, &Ordering::SameOrder.column(Outcome::Failed), &path)?,
        ChartKind::FailedRandom => render_metric_to(table, &Ordering::RandomOrder.column(Outcome::Failed), &path)?,
        ChartKind::StackedSame => render_stacked(table, Ordering::SameOrder, &path)?,
        ChartKind::StackedRandom => render_stacked(table, Ordering::RandomOrder, &path)?,
    }

    Ok(path)
}

/// Render a per-test bar chart for an arbitrary count column.
pub fn render_metric(table: &CombinedTable, column: &str, out_dir: &Path) -> Result<PathBuf, AppError> {
    let path = out_dir.join(metric_file_name(column));
    render_metric_to(table, column, &path)?;
    Ok(path)
}

/// Execute a full render run and return the table plus every written file.
pub fn run_render(config: &RenderConfig) -> Result<RunOutput, AppError> {
    let table = load_table(&config.results_dir, &config.filter)?;

    if let Some(path) = &config.export {
        write_combined_csv(path, &table)?;
    }

    if table.is_empty() {
        return Err(AppError::no_data(format!(
            "No rows remain after filtering to project(s) {} in '{}'.",
            config.filter.projects.join(", "),
            config.results_dir.display()
        )));
    }

    fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::output(format!(
            "Failed to create output directory '{}': {e}",
            config.out_dir.display()
        ))
    })?;

    let mut written = Vec::with_capacity(config.charts.len() + config.metrics.len());
    for kind in &config.charts {
        written.push(render_chart(&table, *kind, &config.out_dir)?);
    }
    for column in &config.metrics {
        written.push(render_metric(&table, column, &config.out_dir)?);
    }

    Ok(RunOutput { table, written })
}

fn render_grouped(table: &CombinedTable, ordering: Ordering, path: &Path) -> Result<(), AppError> {
    let agg = outcomes_by_test(table, ordering)?;
    render_bar_figure(&grouped_stacked_figure(&agg, None), path)
}

fn render_stacked(table: &CombinedTable, ordering: Ordering, path: &Path) -> Result<(), AppError> {
    let agg = outcomes_by_test(table, ordering)?;
    render_bar_figure(&stacked_figure(&agg, None), path)
}

fn render_metric_to(table: &CombinedTable, column: &str, path: &Path) -> Result<(), AppError> {
    let agg = metric_by_test(table, column)?;
    render_bar_figure(&metric_figure(&agg, None), path)
}

/// `<column>_by_test.png`, with characters unsafe in file names replaced.
fn metric_file_name(column: &str) -> String {
    let stem: String = column
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{stem}_by_test.png")
}
