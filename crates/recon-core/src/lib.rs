//! Reconciliation engine.
//!
//! Everything here operates on the dynamic [`recon_model::Dataset`] and is
//! driven by the typed configuration from `recon-config`: key generation,
//! the validator rule catalogue, splitters, the anti-join matching
//! algorithms with their tie-break and campaign rules, and the stage
//! processors the pipeline runs in declared order.

pub mod antijoin;
pub mod campaign;
pub mod key;
pub mod priority;
pub mod processors;
pub mod split;
pub mod validate;

pub use antijoin::{key_set, subtract};
pub use campaign::{apply_reallocation, build_reallocation_membership, classify_campaigns};
pub use key::generate_keys;
pub use priority::{DedupeOutcome, REASON_COLUMN, REFERENCE_KEY_COLUMN, dedupe_by_priority};
pub use processors::{StageEnv, StageProcessor, build_processor};
pub use split::run_splitters;
pub use validate::{ValidatorEnv, run_validator, run_validators};
