//! `flaky-charts` library crate.
//!
//! The binary (`flaky-charts`) is a thin wrapper around this library so that:
//!
//! - loading, aggregation and figure layout are testable without spawning processes
//! - each chart can be produced on its own from a loaded table

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
