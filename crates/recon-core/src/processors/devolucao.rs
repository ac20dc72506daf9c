//! Devolução: the ledger − client anti-join. Ledger records the client no
//! longer reports are candidates for return.

use tracing::info;

use recon_model::{Result, RunContext, StageOutcome};

use crate::antijoin::subtract;

use super::{StageEnv, StageProcessor, export_stage};

pub struct Devolucao;

impl StageProcessor for Devolucao {
    fn name(&self) -> &'static str {
        "devolucao"
    }

    fn process(&self, env: &StageEnv<'_>, ctx: &mut RunContext) -> Result<StageOutcome> {
        let client_key = env.config.client_source.key.output_column();
        let ledger_key = env.config.max_source.key.output_column();

        let returns = subtract(&ctx.ledger_data, ledger_key, &ctx.client_data, client_key)?;

        let mut outcome = StageOutcome::default();
        outcome
            .metadata
            .insert("return_candidates".to_string(), returns.len().to_string());
        if !returns.is_empty() {
            let path = export_stage(
                env,
                ctx,
                env.config.max_source.export.as_ref(),
                self.name(),
                &[],
                &returns,
            )?;
            outcome.output_files.push(path);
        }
        info!(candidates = returns.len(), "devolucao complete");
        ctx.register_files(outcome.output_files.clone());
        outcome.data = returns;
        Ok(outcome)
    }
}
