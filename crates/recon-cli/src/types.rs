use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct RunResult {
    pub client: String,
    pub output_dir: PathBuf,
    pub stages: Vec<StageSummary>,
    /// Errors that mark the run unsuccessful (stage failures, loader
    /// failures).
    pub errors: Vec<String>,
    pub has_errors: bool,
}

#[derive(Debug)]
pub struct StageSummary {
    pub stage: String,
    pub records: usize,
    pub duration_ms: u128,
    pub output_files: Vec<PathBuf>,
    /// Soft findings (validator rejections, disabled splitters). Reported
    /// but not fatal.
    pub findings: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}
