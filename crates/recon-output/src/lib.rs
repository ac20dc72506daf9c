//! File artifact output.
//!
//! Every export clears the prior run's files for its own filename prefix
//! before writing (last-run-wins: exactly one artifact per prefix at a
//! time), optionally stamps the new file with the run timestamp, and wraps
//! the delimited payload in a single-file zip container when configured.

mod export;

pub use export::{ExportError, ExportSettings, export_dataset, run_timestamp};
