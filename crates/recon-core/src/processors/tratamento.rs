//! Tratamento: source preparation.
//!
//! Keys both working datasets, enforces the declared required columns,
//! runs the validator chains, and exports the invalid partitions. The
//! valid partitions become the authoritative working state for the
//! stages that follow.

use tracing::info;

use recon_config::SourceConfig;
use recon_model::{Dataset, ReconError, Result, RunContext, StageOutcome};

use crate::key::generate_keys;
use crate::split::run_splitters;
use crate::validate::{ValidatorEnv, run_validators};

use super::{StageEnv, StageProcessor, export_stage};

pub struct Tratamento;

impl StageProcessor for Tratamento {
    fn name(&self) -> &'static str {
        "tratamento"
    }

    fn process(&self, env: &StageEnv<'_>, ctx: &mut RunContext) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();

        let client_source = env.config.client_source.clone();
        let data = std::mem::take(&mut ctx.client_data);
        ctx.client_data = self.prepare_side(env, ctx, "client", &client_source, data, &mut outcome)?;

        let max_source = env.config.max_source.clone();
        let data = std::mem::take(&mut ctx.ledger_data);
        ctx.ledger_data = self.prepare_side(env, ctx, "ledger", &max_source, data, &mut outcome)?;

        // Splitter pre-pass: bucket counts only, for run diagnostics. The
        // actual routing happens when batimento exports its result.
        if !client_source.splitters.is_empty() {
            let (splits, errors) = run_splitters(
                &client_source.splitters,
                ctx.client_data.clone(),
                &client_source.default_bucket,
                env.base_dir,
                env.config.global.encoding,
            );
            outcome.errors.extend(errors);
            let counts: Vec<String> = splits
                .splits
                .iter()
                .map(|(bucket, data)| format!("{bucket}={}", data.len()))
                .collect();
            outcome
                .metadata
                .insert("client_buckets".to_string(), counts.join(";"));
        }

        info!(
            client = ctx.client_data.len(),
            ledger = ctx.ledger_data.len(),
            "tratamento complete"
        );
        outcome.data = ctx.client_data.clone();
        ctx.register_files(outcome.output_files.clone());
        Ok(outcome)
    }
}

impl Tratamento {
    fn prepare_side(
        &self,
        env: &StageEnv<'_>,
        ctx: &RunContext,
        side: &str,
        source: &SourceConfig,
        mut data: Dataset,
        outcome: &mut StageOutcome,
    ) -> Result<Dataset> {
        if !data.is_empty() {
            for column in &source.required_columns {
                if !data.has_column(column) {
                    return Err(ReconError::MissingRequiredColumn {
                        side: side.to_string(),
                        column: column.clone(),
                    });
                }
            }
        }
        generate_keys(&mut data, &source.key);

        let validator_env = ValidatorEnv {
            base_dir: env.base_dir,
            reference_date: ctx.reference_date,
            encoding: env.config.global.encoding,
        };
        let validated = run_validators(&source.validators, data, &validator_env);
        outcome.errors.extend(validated.errors);
        outcome.metadata.insert(
            format!("{side}_valid"),
            validated.valid.len().to_string(),
        );
        outcome.metadata.insert(
            format!("{side}_invalid"),
            validated.invalid.len().to_string(),
        );
        if !validated.invalid.is_empty() {
            let path = export_stage(
                env,
                ctx,
                source.export.as_ref(),
                self.name(),
                &["invalid", side],
                &validated.invalid,
            )?;
            outcome.output_files.push(path);
        }
        Ok(validated.valid)
    }
}
