//! Configuration discovery, loading, and semantic validation.

use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::schema::{
    ClientConfig, KeyConfig, LoaderConfig, ProcessorKind, SourceConfig, SplitterConfig,
    ValidatorConfig,
};

/// List clients with a configuration document in `config_dir`, sorted.
pub fn list_clients(config_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut clients = Vec::new();
    for entry in std::fs::read_dir(config_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            clients.push(stem.to_string());
        }
    }
    clients.sort();
    Ok(clients)
}

/// Load and validate the configuration for one client.
pub fn load_client_config(config_dir: &Path, client: &str) -> Result<ClientConfig> {
    let path = config_dir.join(format!("{client}.json"));
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            client: client.to_string(),
            dir: config_dir.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config: ClientConfig =
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
    let findings = validate_config(&config);
    if findings.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Invalid { findings })
    }
}

/// Semantic checks beyond what serde enforces. Returns human-readable
/// findings; an empty list means the configuration can run.
pub fn validate_config(config: &ClientConfig) -> Vec<String> {
    let mut findings = Vec::new();

    if config.name.trim().is_empty() {
        findings.push("client name is empty".to_string());
    }

    validate_separator(config.global.separator, "global", &mut findings);
    validate_source(&config.client_source, "client_source", &mut findings);
    validate_source(&config.max_source, "max_source", &mut findings);

    if !config.processors.iter().any(|processor| processor.enabled) {
        findings.push("no enabled processors".to_string());
    }
    for processor in &config.processors {
        if let ProcessorKind::Batimento { params } = &processor.kind {
            if params.aging_threshold_days <= 0 {
                findings.push(format!(
                    "batimento: aging_threshold_days must be positive, got {}",
                    params.aging_threshold_days
                ));
            }
            if params.contract_key_columns.is_empty() {
                findings.push("batimento: contract_key_columns is empty".to_string());
            }
            if let Some(reallocation) = &params.reallocation {
                if let Err(error) = regex::Regex::new(&reallocation.tag_pattern) {
                    findings.push(format!(
                        "batimento: reallocation tag_pattern does not compile: {error}"
                    ));
                }
                if reallocation.open_statuses.is_empty() {
                    findings.push("batimento: reallocation open_statuses is empty".to_string());
                }
                validate_loader_separator(
                    &reallocation.snapshot,
                    "batimento reallocation snapshot",
                    &mut findings,
                );
            }
        }
    }

    findings
}

/// Delimited payloads are encoded and decoded byte-wise; a separator
/// outside the ASCII range would truncate when narrowed to one byte.
fn validate_separator(separator: char, what: &str, findings: &mut Vec<String>) {
    if !separator.is_ascii() {
        findings.push(format!(
            "{what}: separator {separator:?} is not an ASCII character"
        ));
    }
}

fn validate_loader_separator(loader: &LoaderConfig, what: &str, findings: &mut Vec<String>) {
    if let LoaderConfig::Csv {
        separator: Some(separator),
        ..
    } = loader
    {
        validate_separator(*separator, what, findings);
    }
}

fn validate_source(source: &SourceConfig, side: &str, findings: &mut Vec<String>) {
    match &source.key {
        KeyConfig::Composite { components, .. } => {
            if components.is_empty() {
                findings.push(format!("{side}: composite key has no components"));
            }
        }
        KeyConfig::Column { column, .. } => {
            if column.trim().is_empty() {
                findings.push(format!("{side}: key column name is empty"));
            }
        }
    }

    validate_loader_separator(&source.loader, side, findings);
    if let Some(export) = &source.export {
        if let Some(separator) = export.separator {
            validate_separator(separator, side, findings);
        }
    }

    if let LoaderConfig::Inline { columns, rows } = &source.loader {
        for (index, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                findings.push(format!(
                    "{side}: inline row {index} has {} cells, expected {}",
                    row.len(),
                    columns.len()
                ));
            }
        }
    }

    for validator in &source.validators {
        match validator {
            ValidatorConfig::Required { columns } if columns.is_empty() => {
                findings.push(format!("{side}: required validator lists no columns"));
            }
            ValidatorConfig::Status {
                include, exclude, ..
            } if include.is_empty() && exclude.is_empty() => {
                findings.push(format!(
                    "{side}: status validator has neither include nor exclude values"
                ));
            }
            ValidatorConfig::TypeFilter {
                include, exclude, ..
            } if include.is_empty() && exclude.is_empty() => {
                findings.push(format!(
                    "{side}: type_filter validator has neither include nor exclude values"
                ));
            }
            ValidatorConfig::Aging {
                min_date,
                max_date,
                max_age_days,
                min_age_days,
                ..
            } if min_date.is_none()
                && max_date.is_none()
                && max_age_days.is_none()
                && min_age_days.is_none() =>
            {
                findings.push(format!("{side}: aging validator has no window bounds"));
            }
            ValidatorConfig::Regex { pattern, .. } => {
                if let Err(error) = regex::Regex::new(pattern) {
                    findings.push(format!("{side}: regex pattern does not compile: {error}"));
                }
            }
            ValidatorConfig::LineBreak { columns, .. } if columns.is_empty() => {
                findings.push(format!("{side}: line_break validator lists no columns"));
            }
            _ => {}
        }
    }

    for splitter in &source.splitters {
        match splitter {
            SplitterConfig::Campaign { pattern, .. } => {
                if let Err(error) = regex::Regex::new(pattern) {
                    findings.push(format!(
                        "{side}: campaign splitter pattern does not compile: {error}"
                    ));
                }
            }
            SplitterConfig::FieldValue { buckets, .. } if buckets.is_empty() => {
                findings.push(format!("{side}: field_value splitter has no buckets"));
            }
            _ => {}
        }
    }

    if source.default_bucket.trim().is_empty() {
        findings.push(format!("{side}: default bucket name is empty"));
    }
}
