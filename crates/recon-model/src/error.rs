use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown client: {0}")]
    UnknownClient(String),

    /// A reconciliation step needed a key column that a side does not carry.
    /// Fatal for the step: there is no best-effort matching.
    #[error("{side} dataset is missing key column {column}")]
    MissingKeyColumn { side: String, column: String },

    #[error("{side} dataset is missing required column {column}")]
    MissingRequiredColumn { side: String, column: String },

    #[error("loader error for {path}: {message}")]
    Loader { path: PathBuf, message: String },

    #[error("export error: {0}")]
    Export(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReconError>;
