//! Per-run pipeline context.
//!
//! One [`RunContext`] is created at run start and dropped at run end. It is
//! exclusively owned by that run: stages mutate the working datasets in
//! place and must treat what they receive as the current authoritative
//! state, never a stale snapshot. Nothing here is shared across runs or
//! threads.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::table::Dataset;

#[derive(Debug)]
pub struct RunContext {
    /// Client name the run is for.
    pub client: String,
    /// Working client-side dataset (mutated stage by stage).
    pub client_data: Dataset,
    /// Working ledger-side (MAX) dataset.
    pub ledger_data: Dataset,
    /// Duplicate rows demoted by the priority tie-break, kept with a
    /// back-reference to the primary row they lost to.
    pub enrichment: Dataset,
    /// Accumulated error messages across stages.
    pub errors: Vec<String>,
    /// Registry of files produced by export steps.
    pub output_files: Vec<PathBuf>,
    /// Free-form run metadata (loader diagnostics, stage counters).
    pub metadata: BTreeMap<String, String>,
    /// "Today" for aging calculations; overridable for reproducible runs.
    pub reference_date: NaiveDate,
    /// Root directory for this run's artifacts.
    pub output_dir: PathBuf,
}

impl RunContext {
    pub fn new(client: impl Into<String>, output_dir: PathBuf, reference_date: NaiveDate) -> Self {
        Self {
            client: client.into(),
            client_data: Dataset::default(),
            ledger_data: Dataset::default(),
            enrichment: Dataset::default(),
            errors: Vec::new(),
            output_files: Vec::new(),
            metadata: BTreeMap::new(),
            reference_date,
            output_dir,
        }
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn register_files<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.output_files.extend(paths);
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
