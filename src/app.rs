//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and installs logging
//! - parses CLI arguments
//! - loads and filters the result files
//! - renders charts or prints the ingest summary

use clap::Parser;

use crate::cli::{Command, InputArgs, RenderArgs, SummaryArgs};
use crate::domain::{ChartKind, FilterConfig, RenderConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `flaky-charts` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    crate::logging::init();

    // `flaky-charts` with no subcommand (or only flags) means `render`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Render(args) => handle_render(args),
        Command::Summary(args) => handle_summary(args),
    }
}

fn handle_render(args: RenderArgs) -> Result<(), AppError> {
    let config = render_config_from_args(&args);
    let run = pipeline::run_render(&config)?;

    for path in &run.written {
        println!("{}", path.display());
    }
    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let table = pipeline::load_table(&args.input.results_dir, &filter_from_args(&args.input))?;

    if args.json {
        println!("{}", crate::report::format_summary_json(&table)?);
    } else {
        print!("{}", crate::report::format_ingest_summary(&table));
    }
    Ok(())
}

pub fn render_config_from_args(args: &RenderArgs) -> RenderConfig {
    let requested: Vec<ChartKind> = if args.all {
        ChartKind::ALL.to_vec()
    } else if args.charts.is_empty() {
        ChartKind::DEFAULT.to_vec()
    } else {
        args.charts.clone()
    };

    // Drop repeats, keeping the first mention's position.
    let mut charts = Vec::with_capacity(requested.len());
    for kind in requested {
        if !charts.contains(&kind) {
            charts.push(kind);
        }
    }

    let mut metrics: Vec<String> = Vec::with_capacity(args.metrics.len());
    for column in &args.metrics {
        if !metrics.contains(column) {
            metrics.push(column.clone());
        }
    }

    RenderConfig {
        results_dir: args.input.results_dir.clone(),
        out_dir: args.out_dir.clone(),
        filter: filter_from_args(&args.input),
        charts,
        metrics,
        export: args.export.clone(),
    }
}

fn filter_from_args(input: &InputArgs) -> FilterConfig {
    let projects: Vec<String> = input
        .projects
        .iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    if projects.is_empty() {
        FilterConfig::default()
    } else {
        FilterConfig {
            projects,
            ..FilterConfig::default()
        }
    }
}

/// Rewrite argv so `flaky-charts` defaults to `flaky-charts render`.
///
/// Rules:
/// - `flaky-charts`                      -> `flaky-charts render`
/// - `flaky-charts --chart X ...`        -> `flaky-charts render --chart X ...`
/// - `flaky-charts --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("render".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "render" | "summary");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "render".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn render_args(args: &[&str]) -> RenderArgs {
        match Cli::parse_from(rewrite_args(argv(args))).command {
            Command::Render(args) => args,
            Command::Summary(_) => panic!("expected render"),
        }
    }

    #[test]
    fn bare_invocation_and_flags_default_to_render() {
        assert_eq!(rewrite_args(argv(&["flaky-charts"])), argv(&["flaky-charts", "render"]));
        assert_eq!(
            rewrite_args(argv(&["flaky-charts", "--all"])),
            argv(&["flaky-charts", "render", "--all"])
        );
        assert_eq!(rewrite_args(argv(&["flaky-charts", "--help"])), argv(&["flaky-charts", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["flaky-charts", "summary", "--json"])),
            argv(&["flaky-charts", "summary", "--json"])
        );
    }

    #[test]
    fn default_chart_set() {
        let config = render_config_from_args(&render_args(&["flaky-charts", "--results-dir", "r"]));
        assert_eq!(config.charts, ChartKind::DEFAULT.to_vec());
        assert_eq!(config.filter.projects, vec!["flapy_example", "avwx-engine"]);
    }

    #[test]
    fn metrics_are_added_to_the_default_set() {
        let config = render_config_from_args(&render_args(&[
            "flaky-charts",
            "--metric",
            "Failed_sameOrder",
            "--metric",
            "Failed_sameOrder",
        ]));
        assert_eq!(config.charts, ChartKind::DEFAULT.to_vec());
        assert_eq!(config.metrics, vec!["Failed_sameOrder"]);
    }

    #[test]
    fn explicit_charts_are_deduplicated() {
        let config = render_config_from_args(&render_args(&[
            "flaky-charts",
            "--chart",
            "flakiness-bar",
            "--chart",
            "grouped-same",
            "--chart",
            "flakiness-bar",
            "--project",
            " requests ",
        ]));
        assert_eq!(config.charts, vec![ChartKind::FlakinessBar, ChartKind::GroupedSame]);
        assert_eq!(config.filter.projects, vec!["requests"]);
        assert_eq!(config.filter.excluded_classification, "not flaky");
    }

    #[test]
    fn all_selects_every_chart() {
        let config = render_config_from_args(&render_args(&["flaky-charts", "--all"]));
        assert_eq!(config.charts.len(), ChartKind::ALL.len());
    }
}
