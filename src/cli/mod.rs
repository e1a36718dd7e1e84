//! Command-line parsing.
//!
//! Argument parsing and command dispatch stay separate from the loading and
//! charting code. Every input option can also come from the environment (or a
//! `.env` file, loaded before parsing).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ChartKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "flaky-charts",
    version,
    about = "Charts for flaky-test detection results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the result files and render charts as PNG (the default command).
    Render(RenderArgs),
    /// Print what was loaded: files, kept rows, projects and classifications.
    Summary(SummaryArgs),
}

/// Where results come from and which rows to keep.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Directory holding the result CSV files.
    #[arg(long, env = "FLAKY_RESULTS_DIR", default_value = "results")]
    pub results_dir: PathBuf,

    /// Project to keep (repeatable or comma-separated).
    ///
    /// Defaults to `flapy_example` and `avwx-engine`.
    #[arg(long = "project", env = "FLAKY_PROJECTS", value_delimiter = ',')]
    pub projects: Vec<String>,
}

/// Options for rendering charts.
#[derive(Debug, Parser, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory the PNG files are written to.
    #[arg(long, env = "FLAKY_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Chart to render (repeatable). Defaults to both grouped charts plus the
    /// flakiness bar and pie charts.
    #[arg(long = "chart", value_enum)]
    pub charts: Vec<ChartKind>,

    /// Render every chart kind.
    #[arg(long, conflicts_with = "charts")]
    pub all: bool,

    /// Also render a per-test bar chart for this count column (repeatable).
    #[arg(long = "metric", value_name = "COLUMN")]
    pub metrics: Vec<String>,

    /// Export the combined table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for the ingest summary.
#[derive(Debug, Parser, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}
