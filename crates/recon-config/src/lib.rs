//! Declarative per-client configuration.
//!
//! One JSON document per client describes the whole run: how each side is
//! loaded, how join keys are derived, which validators and splitters apply,
//! and which stage processors run in which order. Every rule family is an
//! internally tagged enum, so an unknown `type` fails at parse time and
//! dispatch is an exhaustive `match` rather than a string-keyed registry.

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, Result};
pub use loader::{list_clients, load_client_config, validate_config};
pub use schema::{
    BaixaParams, BatimentoParams, ClientConfig, ExportConfig, ExportFormat, GlobalConfig,
    KeyConfig, LineBreakAction, LoaderConfig, MatchMode, NullPolicy, ProcessorConfig,
    ProcessorKind, ReallocationParams, RegexMode, SourceConfig, SplitterConfig, TextEncoding,
    ValidatorConfig,
};
