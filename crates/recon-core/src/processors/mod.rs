//! Stage processors.
//!
//! One processor per pipeline stage, selected by `match` over the typed
//! processor configuration. The engine runs them strictly in declared
//! order; a processor error is caught at the engine boundary and appended
//! to the run's error list without stopping later stages.

mod baixa;
mod batimento;
mod devolucao;
mod enriquecimento;
mod tratamento;

use std::path::{Path, PathBuf};

use recon_config::{ClientConfig, ExportConfig, ExportFormat, ProcessorConfig, ProcessorKind};
use recon_model::{Dataset, ReconError, Result, RunContext, StageOutcome};
use recon_output::{ExportSettings, export_dataset, run_timestamp};

pub use baixa::Baixa;
pub use batimento::Batimento;
pub use devolucao::Devolucao;
pub use enriquecimento::Enriquecimento;
pub use tratamento::Tratamento;

/// Immutable surroundings of a stage run: the client configuration and the
/// directory relative loader paths resolve against.
#[derive(Debug, Clone, Copy)]
pub struct StageEnv<'a> {
    pub config: &'a ClientConfig,
    pub base_dir: &'a Path,
}

/// Contract for one pipeline stage. Working datasets travel inside the
/// [`RunContext`]; what a stage receives is the current authoritative
/// state, and it mutates that state in place.
pub trait StageProcessor {
    fn name(&self) -> &'static str;

    fn process(&self, env: &StageEnv<'_>, ctx: &mut RunContext) -> Result<StageOutcome>;
}

/// Map a processor configuration to its implementation.
pub fn build_processor(config: &ProcessorConfig) -> Box<dyn StageProcessor> {
    match &config.kind {
        ProcessorKind::Tratamento => Box::new(Tratamento),
        ProcessorKind::Batimento { params } => Box::new(Batimento {
            params: params.clone(),
        }),
        ProcessorKind::Devolucao => Box::new(Devolucao),
        ProcessorKind::Baixa { params } => Box::new(Baixa {
            params: params.clone(),
        }),
        ProcessorKind::Enriquecimento => Box::new(Enriquecimento),
    }
}

/// Write one stage artifact and return its path.
///
/// Settings resolve from the export override where present, falling back
/// to the run-wide defaults: prefix `<client>_<stage>` plus qualifiers,
/// subdirectory named after the stage, zip container format.
pub(crate) fn export_stage(
    env: &StageEnv<'_>,
    ctx: &RunContext,
    export: Option<&ExportConfig>,
    stage: &str,
    qualifiers: &[&str],
    dataset: &Dataset,
) -> Result<PathBuf> {
    let global = &env.config.global;
    let subdir = export
        .and_then(|export| export.subdir.as_deref())
        .unwrap_or(stage);
    let base_prefix = export
        .map(|export| export.filename_prefix.clone())
        .unwrap_or_else(|| format!("{}_{stage}", ctx.client.to_lowercase()));
    let mut prefix = base_prefix;
    for qualifier in qualifiers {
        prefix.push('_');
        prefix.push_str(&qualifier.to_lowercase());
    }
    let add_timestamp = export
        .and_then(|export| export.add_timestamp)
        .unwrap_or(global.add_timestamp);

    let settings = ExportSettings {
        directory: ctx.output_dir.join(subdir),
        filename_prefix: prefix,
        format: export.map(|export| export.format).unwrap_or(ExportFormat::default()),
        separator: export
            .and_then(|export| export.separator)
            .unwrap_or(global.separator),
        encoding: export
            .and_then(|export| export.encoding)
            .unwrap_or(global.encoding),
        timestamp: add_timestamp.then(run_timestamp),
    };
    export_dataset(dataset, &settings).map_err(|error| ReconError::Export(error.to_string()))
}

#[cfg(test)]
pub(crate) mod testutil {
    use recon_config::{
        ClientConfig, GlobalConfig, KeyConfig, LoaderConfig, ProcessorConfig, ProcessorKind,
        SourceConfig,
    };

    pub fn inline_source(columns: &[&str], rows: &[&[&str]], key_components: &[&str]) -> SourceConfig {
        SourceConfig {
            loader: LoaderConfig::Inline {
                columns: columns.iter().map(|c| (*c).to_string()).collect(),
                rows: rows
                    .iter()
                    .map(|row| row.iter().map(|c| (*c).to_string()).collect())
                    .collect(),
            },
            key: KeyConfig::Composite {
                components: key_components.iter().map(|c| (*c).to_string()).collect(),
                separator: "|".to_string(),
                output_column: "CHAVE".to_string(),
            },
            required_columns: Vec::new(),
            validators: Vec::new(),
            splitters: Vec::new(),
            default_bucket: "GERAL".to_string(),
            export: None,
        }
    }

    pub fn config(client_source: SourceConfig, max_source: SourceConfig) -> ClientConfig {
        ClientConfig {
            name: "acme".to_string(),
            version: None,
            description: None,
            client_source,
            max_source,
            processors: vec![ProcessorConfig {
                kind: ProcessorKind::Tratamento,
                enabled: true,
            }],
            global: GlobalConfig {
                add_timestamp: false,
                ..GlobalConfig::default()
            },
        }
    }
}
