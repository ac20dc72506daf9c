//! Reconciliation CLI library: logging setup, the pipeline engine, and the
//! run summary renderer. The binary in `main.rs` wires these to the
//! command-line surface.

pub mod logging;
pub mod pipeline;
pub mod summary;
pub mod types;
