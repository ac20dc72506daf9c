//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "recon",
    version,
    about = "Billing reconciliation pipeline",
    long_about = "Reconcile an internal billing ledger against external client \
                  ledgers.\n\n\
                  Runs the configured pipeline per client: loading, key \
                  generation, validation, anti-join matching (batimento, \
                  devolucao, baixa), campaign classification, and versioned \
                  file artifact export."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the reconciliation pipeline for one client.
    Run(RunArgs),

    /// List the clients found in the configuration directory.
    List(ListArgs),

    /// Load and semantically validate a client configuration.
    Validate(ValidateArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Client name (matches <CLIENT>.json in the configuration directory).
    #[arg(value_name = "CLIENT")]
    pub client: String,

    /// Directory holding per-client configuration files.
    #[arg(long = "config-dir", value_name = "DIR", default_value = "config")]
    pub config_dir: PathBuf,

    /// Directory relative loader and roster paths resolve against.
    #[arg(long = "input-dir", value_name = "DIR", default_value = ".")]
    pub input_dir: PathBuf,

    /// Root directory for run artifacts (a per-client segment is created
    /// underneath).
    #[arg(long = "output-dir", value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Directory holding per-client configuration files.
    #[arg(long = "config-dir", value_name = "DIR", default_value = "config")]
    pub config_dir: PathBuf,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Client name (matches <CLIENT>.json in the configuration directory).
    #[arg(value_name = "CLIENT")]
    pub client: String,

    /// Directory holding per-client configuration files.
    #[arg(long = "config-dir", value_name = "DIR", default_value = "config")]
    pub config_dir: PathBuf,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
