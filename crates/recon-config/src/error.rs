use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration found for client {client} in {dir}")]
    NotFound { client: String, dir: PathBuf },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Semantic validation findings; the configuration parsed but cannot run.
    #[error("invalid configuration: {}", findings.join("; "))]
    Invalid { findings: Vec<String> },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
