//! Per-stage result types shared across the pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::table::Dataset;

/// Result of running one validator rule over a dataset.
///
/// `valid` and `invalid` partition the input exactly: every input row
/// appears in exactly one of the two, and their sizes sum to the input size.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: Dataset,
    pub invalid: Dataset,
    /// Human-readable findings (rule name, rejected count, sample reasons).
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn rejected(&self) -> usize {
        self.invalid.len()
    }
}

/// Result of running a splitter chain over a dataset.
///
/// Buckets partition the input: no row is dropped or duplicated across
/// named groups. Unmatched rows land in the configured default bucket.
#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub splits: BTreeMap<String, Dataset>,
}

impl SplitOutcome {
    pub fn total_rows(&self) -> usize {
        self.splits.values().map(Dataset::len).sum()
    }

    pub fn bucket(&self, name: &str) -> Option<&Dataset> {
        self.splits.get(name)
    }
}

/// What a loader hands back. Failures surface as metadata, not errors:
/// the engine decides whether an empty result is fatal for its stage.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    pub data: Dataset,
    pub metadata: BTreeMap<String, String>,
}

impl LoadResult {
    pub fn failed(message: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("error".to_string(), message.into());
        Self {
            data: Dataset::default(),
            metadata,
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.metadata.get("error").map(String::as_str)
    }
}

/// Result of one stage processor run.
#[derive(Debug, Clone, Default)]
pub struct StageOutcome {
    /// The stage's primary output dataset (becomes the next stage's input
    /// where the pipeline says so).
    pub data: Dataset,
    pub metadata: BTreeMap<String, String>,
    pub output_files: Vec<PathBuf>,
    pub errors: Vec<String>,
}

impl StageOutcome {
    pub fn record_count(&self) -> usize {
        self.data.len()
    }
}
