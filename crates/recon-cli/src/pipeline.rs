//! Pipeline engine.
//!
//! One run: load the two sources, then execute the enabled stage
//! processors strictly in declared order. A stage failure is caught here,
//! appended to the run's error list, and later stages still run against
//! the current context state; artifacts already written stay on disk.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info, info_span};

use recon_config::ClientConfig;
use recon_core::{StageEnv, build_processor};
use recon_ingest::load_source;
use recon_model::RunContext;

use crate::types::{RunResult, StageSummary};

/// Execute the full pipeline for one client.
///
/// `base_dir` is what relative loader and roster paths resolve against;
/// artifacts land under `output_dir`.
pub fn run_pipeline(
    config: &ClientConfig,
    base_dir: &Path,
    output_dir: &Path,
) -> Result<RunResult> {
    let reference_date = config
        .global
        .reference_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let mut ctx = RunContext::new(&config.name, output_dir.to_path_buf(), reference_date);
    let span = info_span!("run", client = %config.name, %reference_date);
    let _guard = span.enter();

    load_sides(config, base_dir, &mut ctx);

    let env = StageEnv { config, base_dir };
    let mut stages = Vec::new();
    for processor_config in &config.processors {
        if !processor_config.enabled {
            info!(
                stage = processor_config.kind.stage_name(),
                "stage disabled, skipping"
            );
            continue;
        }
        let processor = build_processor(processor_config);
        let stage = processor.name();
        let span = info_span!("stage", stage);
        let _guard = span.enter();
        let started = Instant::now();
        match processor.process(&env, &mut ctx) {
            Ok(outcome) => {
                let duration_ms = started.elapsed().as_millis();
                info!(
                    stage,
                    records = outcome.record_count(),
                    artifacts = outcome.output_files.len(),
                    duration_ms,
                    "stage complete"
                );
                stages.push(StageSummary {
                    stage: stage.to_string(),
                    records: outcome.record_count(),
                    duration_ms,
                    output_files: outcome.output_files,
                    findings: outcome.errors,
                    metadata: outcome.metadata,
                });
            }
            Err(stage_error) => {
                let duration_ms = started.elapsed().as_millis();
                error!(stage, %stage_error, "stage failed");
                ctx.push_error(format!("{stage}: {stage_error}"));
                stages.push(StageSummary {
                    stage: stage.to_string(),
                    records: 0,
                    duration_ms,
                    output_files: Vec::new(),
                    findings: Vec::new(),
                    metadata: Default::default(),
                });
            }
        }
    }

    let has_errors = ctx.has_errors();
    Ok(RunResult {
        client: ctx.client,
        output_dir: ctx.output_dir,
        stages,
        errors: ctx.errors,
        has_errors,
    })
}

/// Load both sources into the context. Loader failures surface as run
/// errors (the stages still run, against empty datasets).
fn load_sides(config: &ClientConfig, base_dir: &Path, ctx: &mut RunContext) {
    let client = load_source(&config.client_source.loader, base_dir, &config.global);
    if let Some(message) = client.error() {
        ctx.push_error(format!("client loader: {message}"));
    }
    for (key, value) in &client.metadata {
        ctx.set_metadata(format!("client_{key}"), value.clone());
    }
    ctx.client_data = client.data;

    let ledger = load_source(&config.max_source.loader, base_dir, &config.global);
    if let Some(message) = ledger.error() {
        ctx.push_error(format!("ledger loader: {message}"));
    }
    for (key, value) in &ledger.metadata {
        ctx.set_metadata(format!("ledger_{key}"), value.clone());
    }
    ctx.ledger_data = ledger.data;

    info!(
        client_records = ctx.client_data.len(),
        ledger_records = ctx.ledger_data.len(),
        "sources loaded"
    );
}
