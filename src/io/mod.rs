//! Input/output helpers.
//!
//! - result file discovery (`discover`)
//! - CSV ingest + load-time filtering (`ingest`)
//! - combined table export (`export`)

pub mod discover;
pub mod export;
pub mod ingest;

pub use discover::*;
pub use export::*;
pub use ingest::*;
