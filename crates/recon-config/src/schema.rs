//! Typed configuration schema.
//!
//! Free-form per-rule parameter blocks from the source systems become
//! explicit structs here, parsed and validated once at config-load time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

fn default_true() -> bool {
    true
}

fn default_key_column() -> String {
    "CHAVE".to_string()
}

fn default_key_separator() -> String {
    "|".to_string()
}

fn default_separator() -> char {
    ';'
}

fn default_bucket() -> String {
    "GERAL".to_string()
}

fn default_judicial_bucket() -> String {
    "JUDICIAL".to_string()
}

fn default_extrajudicial_bucket() -> String {
    "EXTRAJUDICIAL".to_string()
}

/// Top-level configuration for one reconciliation client.
///
/// Parsed once per run and immutable for the run's duration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Client-side (external ledger) source.
    pub client_source: SourceConfig,
    /// Internal MAX ledger source.
    pub max_source: SourceConfig,
    /// Stage processors, executed strictly in this order.
    pub processors: Vec<ProcessorConfig>,
    #[serde(default)]
    pub global: GlobalConfig,
}

/// One side of the reconciliation: how to load it, key it, clean it, and
/// where its exports go.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SourceConfig {
    pub loader: LoaderConfig,
    pub key: KeyConfig,
    #[serde(default)]
    pub required_columns: Vec<String>,
    #[serde(default)]
    pub validators: Vec<ValidatorConfig>,
    #[serde(default)]
    pub splitters: Vec<SplitterConfig>,
    /// Bucket for rows no splitter claims.
    #[serde(default = "default_bucket")]
    pub default_bucket: String,
    #[serde(default)]
    pub export: Option<ExportConfig>,
}

/// Loader selection. I/O failures surface as metadata on the load result,
/// never as errors from the loader itself.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoaderConfig {
    /// Delimited text file; `.zip` paths are read from inside the container.
    Csv {
        path: PathBuf,
        #[serde(default)]
        separator: Option<char>,
        #[serde(default)]
        encoding: Option<TextEncoding>,
    },
    /// Rows given directly in the configuration. Used by tests and dry runs.
    Inline {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Text encoding of delimited payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// UTF-8 with a byte-order marker on write, BOM-tolerant on read.
    #[default]
    Utf8Bom,
    Latin1,
}

/// Canonical join-key derivation strategy.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyConfig {
    /// Concatenate the cleansed values of `components` in column order.
    Composite {
        components: Vec<String>,
        #[serde(default = "default_key_separator")]
        separator: String,
        #[serde(default = "default_key_column")]
        output_column: String,
    },
    /// Normalize an existing column into the key column.
    Column {
        column: String,
        #[serde(default = "default_key_column")]
        output_column: String,
    },
}

impl KeyConfig {
    pub fn output_column(&self) -> &str {
        match self {
            Self::Composite { output_column, .. } | Self::Column { output_column, .. } => {
                output_column
            }
        }
    }
}

/// String-matching mode for the type filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
    Prefix,
}

/// Regex application mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexMode {
    /// Pattern must cover the whole value.
    #[default]
    FullMatch,
    /// Pattern must match at the start of the value.
    Match,
    /// Pattern may match anywhere.
    Search,
}

/// What to do with rows whose dates fail to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// Null dates reject the row.
    #[default]
    Exclude,
    /// Null dates pass the rule.
    Include,
}

/// What to do with rows carrying embedded line breaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineBreakAction {
    /// Route the row to the invalid partition.
    #[default]
    Reject,
    /// Strip the break characters and keep the row valid.
    Clean,
    /// Keep the row valid but record a finding.
    Flag,
}

/// Validator rule catalogue. One variant per rule, typed parameters only.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorConfig {
    /// Row invalid if any listed column is empty after trimming.
    Required { columns: Vec<String> },
    /// Keep rows whose normalized status is in `include` and/or not in
    /// `exclude`.
    Status {
        column: String,
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    /// Like `Status`, with configurable matching mode.
    TypeFilter {
        column: String,
        #[serde(default)]
        mode: MatchMode,
        #[serde(default)]
        include: Vec<String>,
        #[serde(default)]
        exclude: Vec<String>,
    },
    /// Reject rows whose date falls outside a window expressed as absolute
    /// bounds or as an age-in-days offset from the run's reference date.
    Aging {
        column: String,
        #[serde(default)]
        null_policy: NullPolicy,
        #[serde(default)]
        min_date: Option<NaiveDate>,
        #[serde(default)]
        max_date: Option<NaiveDate>,
        /// Reject rows older than this many days.
        #[serde(default)]
        max_age_days: Option<i64>,
        /// Reject rows younger than this many days.
        #[serde(default)]
        min_age_days: Option<i64>,
    },
    /// Reject implausible dates by year bounds; 1900 is the floor when no
    /// minimum is configured.
    DateRange {
        column: String,
        #[serde(default)]
        min_year: Option<i32>,
        #[serde(default)]
        max_year: Option<i32>,
    },
    /// Exclude (or in whitelist mode keep only) rows whose document appears
    /// in an external roster file.
    Blacklist {
        path: PathBuf,
        column: String,
        /// Roster column holding the documents; first plausible CPF/CNPJ
        /// column when absent or not found.
        #[serde(default)]
        roster_column: Option<String>,
        #[serde(default)]
        whitelist: bool,
    },
    /// Row invalid if the column's value fails the pattern.
    Regex {
        column: String,
        pattern: String,
        #[serde(default)]
        mode: RegexMode,
    },
    /// Detect carriage-return / line-feed characters inside cells.
    LineBreak {
        columns: Vec<String>,
        #[serde(default)]
        action: LineBreakAction,
    },
}

impl ValidatorConfig {
    /// Short rule name used in findings and logs.
    pub fn rule_name(&self) -> &'static str {
        match self {
            Self::Required { .. } => "required",
            Self::Status { .. } => "status",
            Self::TypeFilter { .. } => "type_filter",
            Self::Aging { .. } => "aging",
            Self::DateRange { .. } => "date_range",
            Self::Blacklist { .. } => "blacklist",
            Self::Regex { .. } => "regex",
            Self::LineBreak { .. } => "line_break",
        }
    }
}

/// Splitter rule catalogue. Splitters run in order; each consumes only the
/// rows earlier splitters did not claim.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitterConfig {
    /// Partition by membership in an external CPF/CNPJ roster. Gates which
    /// legal-track export a record lands in.
    Judicial {
        roster_path: PathBuf,
        document_column: String,
        #[serde(default)]
        roster_column: Option<String>,
        #[serde(default = "default_judicial_bucket")]
        judicial_bucket: String,
        #[serde(default = "default_extrajudicial_bucket")]
        extrajudicial_bucket: String,
    },
    /// Claim rows whose column matches a pattern into a named bucket.
    Campaign {
        column: String,
        pattern: String,
        bucket: String,
    },
    /// Route rows by exact field value (value → bucket name).
    FieldValue {
        column: String,
        buckets: BTreeMap<String, String>,
    },
}

/// Stage selection with per-stage typed parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProcessorConfig {
    #[serde(flatten)]
    pub kind: ProcessorKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessorKind {
    /// Keying, validation, and splitting of the loaded datasets.
    Tratamento,
    /// Client − ledger anti-join with dedupe, campaigns, and legal tracks.
    Batimento {
        #[serde(default)]
        params: BatimentoParams,
    },
    /// Ledger − client anti-join: return candidates.
    Devolucao,
    /// Ledger − client anti-join enriched with payment-receipt columns.
    Baixa {
        #[serde(default)]
        params: BaixaParams,
    },
    /// Export of the duplicate side-channel accumulated by batimento.
    Enriquecimento,
}

impl ProcessorKind {
    pub fn stage_name(&self) -> &'static str {
        match self {
            Self::Tratamento => "tratamento",
            Self::Batimento { .. } => "batimento",
            Self::Devolucao => "devolucao",
            Self::Baixa { .. } => "baixa",
            Self::Enriquecimento => "enriquecimento",
        }
    }
}

fn default_document_column() -> String {
    "DOCUMENTO".to_string()
}

fn default_reference_date_column() -> String {
    "DATA_REFERENCIA".to_string()
}

fn default_due_date_column() -> String {
    "VENCIMENTO".to_string()
}

fn default_contract_columns() -> Vec<String> {
    vec!["CONTRATO".to_string()]
}

fn default_aging_threshold() -> i64 {
    1800
}

fn default_campaign_column() -> String {
    "CAMPANHA".to_string()
}

fn default_campaign_low() -> String {
    "CAMPANHA_RECENTE".to_string()
}

fn default_campaign_high() -> String {
    "CAMPANHA_ANTIGA".to_string()
}

/// Parameters for the batimento stage.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BatimentoParams {
    /// Column carrying the CPF/CNPJ used by the duplicate-priority rule.
    #[serde(default = "default_document_column")]
    pub document_column: String,
    /// Reference date column used as the dedupe tie-break.
    #[serde(default = "default_reference_date_column")]
    pub reference_date_column: String,
    /// Due date column aged against the run reference date.
    #[serde(default = "default_due_date_column")]
    pub due_date_column: String,
    /// Contract-level grouping key for the campaign override (distinct from
    /// the per-installment join key).
    #[serde(default = "default_contract_columns")]
    pub contract_key_columns: Vec<String>,
    /// Day threshold splitting the two campaign buckets.
    #[serde(default = "default_aging_threshold")]
    pub aging_threshold_days: i64,
    /// Output column receiving the campaign label.
    #[serde(default = "default_campaign_column")]
    pub campaign_column: String,
    /// Label for ages at or below the threshold.
    #[serde(default = "default_campaign_low")]
    pub campaign_low: String,
    /// Label for ages above the threshold (and undefined ages).
    #[serde(default = "default_campaign_high")]
    pub campaign_high: String,
    /// Optional post-matching campaign reassignment.
    #[serde(default)]
    pub reallocation: Option<ReallocationParams>,
}

impl Default for BatimentoParams {
    fn default() -> Self {
        Self {
            document_column: default_document_column(),
            reference_date_column: default_reference_date_column(),
            due_date_column: default_due_date_column(),
            contract_key_columns: default_contract_columns(),
            aging_threshold_days: default_aging_threshold(),
            campaign_column: default_campaign_column(),
            campaign_low: default_campaign_low(),
            campaign_high: default_campaign_high(),
            reallocation: None,
        }
    }
}

/// Campaign reassignment from a second ledger snapshot. Only relabels rows
/// already in the unmatched result; never adds or removes rows.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReallocationParams {
    /// Campaign label assigned to member rows.
    pub campaign: String,
    /// Loader for the ledger snapshot the membership is built from.
    pub snapshot: LoaderConfig,
    /// Snapshot column with the freeform campaign label.
    pub label_column: String,
    /// Pattern a label must contain for the row to count as tagged.
    pub tag_pattern: String,
    /// Snapshot status column.
    pub status_column: String,
    /// Statuses considered open/unsettled.
    pub open_statuses: Vec<String>,
    /// Snapshot column with the member document.
    pub document_column: String,
}

/// Parameters for the baixa stage.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BaixaParams {
    /// Column carrying the CPF/CNPJ the receipt lookup matches on.
    #[serde(default = "default_document_column")]
    pub document_column: String,
    /// Payment-receipt columns copied from the client snapshot.
    #[serde(default)]
    pub receipt_columns: Vec<String>,
}

impl Default for BaixaParams {
    fn default() -> Self {
        Self {
            document_column: default_document_column(),
            receipt_columns: Vec::new(),
        }
    }
}

/// Export target for one source or stage.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExportConfig {
    pub filename_prefix: String,
    #[serde(default)]
    pub subdir: Option<String>,
    #[serde(default)]
    pub format: ExportFormat,
    /// Overrides the global timestamp policy when set.
    #[serde(default)]
    pub add_timestamp: Option<bool>,
    #[serde(default)]
    pub encoding: Option<TextEncoding>,
    #[serde(default)]
    pub separator: Option<char>,
}

/// Artifact container format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Delimited text wrapped in a single-file zip container.
    #[default]
    Zip,
    /// Plain delimited text.
    Csv,
}

/// Run-wide settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_separator")]
    pub separator: char,
    #[serde(default)]
    pub encoding: TextEncoding,
    /// Append a run timestamp to export filenames.
    #[serde(default = "default_true")]
    pub add_timestamp: bool,
    /// Fixed "today" for aging; current date when absent.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            encoding: TextEncoding::default(),
            add_timestamp: true,
            reference_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_rule_type_fails_at_parse_time() {
        let raw = r#"{ "type": "telepathy", "columns": ["X"] }"#;
        let parsed: std::result::Result<ValidatorConfig, _> = serde_json::from_str(raw);
        assert!(parsed.is_err());
    }

    #[test]
    fn processor_flattening_round_trips() {
        let raw = r#"{ "type": "batimento", "enabled": false, "params": { "aging_threshold_days": 900 } }"#;
        let parsed: ProcessorConfig = serde_json::from_str(raw).unwrap();
        assert!(!parsed.enabled);
        match parsed.kind {
            ProcessorKind::Batimento { params } => {
                assert_eq!(params.aging_threshold_days, 900);
                assert_eq!(params.campaign_column, "CAMPANHA");
            }
            _ => panic!("expected batimento"),
        }
    }

    #[test]
    fn key_config_defaults() {
        let raw = r#"{ "type": "composite", "components": ["CONTRATO", "PARCELA"] }"#;
        let parsed: KeyConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.output_column(), "CHAVE");
        match parsed {
            KeyConfig::Composite { separator, .. } => assert_eq!(separator, "|"),
            KeyConfig::Column { .. } => panic!("expected composite"),
        }
    }
}
