//! Dataset loaders.
//!
//! Loaders deliver a tabular dataset plus metadata. I/O failures (missing
//! file, bad container, decode error) land in `metadata["error"]` on the
//! [`LoadResult`] instead of propagating: the pipeline engine decides
//! whether an empty result is fatal for the stage that needed it.

mod container;
mod delimited;
mod error;
mod roster;

pub use container::read_payload;
pub use delimited::{load_source, parse_delimited};
pub use error::{IngestError, Result};
pub use roster::load_document_roster;
