//! Subcommand implementations.

use anyhow::{Context, Result};

use recon_cli::pipeline::run_pipeline;
use recon_cli::types::RunResult;
use recon_config::{ConfigError, list_clients, load_client_config};

use crate::cli::{ListArgs, RunArgs, ValidateArgs};

pub fn run(args: &RunArgs) -> Result<RunResult> {
    let config = load_client_config(&args.config_dir, &args.client)
        .with_context(|| format!("load configuration for client {}", args.client))?;
    let output_dir = args.output_dir.join(&args.client);
    run_pipeline(&config, &args.input_dir, &output_dir)
}

pub fn run_list(args: &ListArgs) -> Result<()> {
    let clients = list_clients(&args.config_dir).with_context(|| {
        format!(
            "list configuration directory {}",
            args.config_dir.display()
        )
    })?;
    if clients.is_empty() {
        println!(
            "no client configurations in {}",
            args.config_dir.display()
        );
        return Ok(());
    }
    for client in clients {
        println!("{client}");
    }
    Ok(())
}

/// Returns `true` when the configuration is valid.
pub fn run_validate(args: &ValidateArgs) -> Result<bool> {
    match load_client_config(&args.config_dir, &args.client) {
        Ok(config) => {
            println!(
                "{}: configuration valid ({} processors)",
                config.name,
                config.processors.len()
            );
            Ok(true)
        }
        Err(ConfigError::Invalid { findings }) => {
            println!("{}: configuration invalid", args.client);
            for finding in findings {
                println!("- {finding}");
            }
            Ok(false)
        }
        Err(error) => Err(error)
            .with_context(|| format!("load configuration for client {}", args.client)),
    }
}
