use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("bad container {path}: {message}")]
    Container { path: PathBuf, message: String },

    #[error("container {path} holds no file entries")]
    EmptyContainer { path: PathBuf },

    #[error("failed to parse delimited data from {path}: {source}")]
    Parse { path: PathBuf, source: csv::Error },

    #[error("{path} has no header row")]
    NoHeader { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, IngestError>;
