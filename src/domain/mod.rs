//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the combined results table (`CombinedTable`, `RunRecord`, `SourceSummary`)
//! - run configuration (`FilterConfig`, `RenderConfig`)
//! - chart/ordering enums (`ChartKind`, `Ordering`, `Outcome`)

pub mod types;

pub use types::*;
