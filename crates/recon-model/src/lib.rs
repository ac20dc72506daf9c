//! Core data model for the reconciliation pipeline.
//!
//! Datasets are dynamically shaped: column sets are discovered from the
//! source files and per-client configuration, never fixed at compile time.
//! Rows are dictionary-backed with typed accessor helpers for the column
//! families the engine cares about (string, date, numeric).

pub mod context;
pub mod document;
pub mod error;
pub mod outcome;
pub mod table;

pub use context::RunContext;
pub use document::{DocumentKind, clean_document, digits_only};
pub use error::{ReconError, Result};
pub use outcome::{LoadResult, SplitOutcome, StageOutcome, ValidationOutcome};
pub use table::{Dataset, Record, normalize_column};
