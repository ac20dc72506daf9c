//! Enriquecimento: exports the duplicate side-channel accumulated by
//! batimento (demoted rows with their reference key and reason columns).

use tracing::info;

use recon_model::{Result, RunContext, StageOutcome};

use super::{StageEnv, StageProcessor, export_stage};

pub struct Enriquecimento;

impl StageProcessor for Enriquecimento {
    fn name(&self) -> &'static str {
        "enriquecimento"
    }

    fn process(&self, env: &StageEnv<'_>, ctx: &mut RunContext) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();
        outcome.metadata.insert(
            "demoted_rows".to_string(),
            ctx.enrichment.len().to_string(),
        );
        if !ctx.enrichment.is_empty() {
            let path = export_stage(
                env,
                ctx,
                env.config.client_source.export.as_ref(),
                self.name(),
                &[],
                &ctx.enrichment,
            )?;
            outcome.output_files.push(path);
        }
        info!(rows = ctx.enrichment.len(), "enriquecimento complete");
        ctx.register_files(outcome.output_files.clone());
        outcome.data = ctx.enrichment.clone();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priority::{REASON_COLUMN, REFERENCE_KEY_COLUMN};
    use crate::processors::testutil;
    use chrono::NaiveDate;
    use recon_model::{Dataset, Record};

    #[test]
    fn exports_side_channel_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let config = testutil::config(
            testutil::inline_source(&[], &[], &["CONTRATO"]),
            testutil::inline_source(&[], &[], &["CONTRATO"]),
        );
        let env = StageEnv {
            config: &config,
            base_dir: dir.path(),
        };
        let mut ctx = RunContext::new(
            "acme",
            dir.path().to_path_buf(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        ctx.enrichment = Dataset::new(["CHAVE", REFERENCE_KEY_COLUMN, REASON_COLUMN]);
        ctx.enrichment.push_row(Record::from_pairs([
            ("CHAVE", "K1"),
            (REFERENCE_KEY_COLUMN, "K1"),
            (REASON_COLUMN, "ADDITIONAL_DOCUMENT"),
        ]));

        let outcome = Enriquecimento.process(&env, &mut ctx).unwrap();
        assert_eq!(outcome.output_files.len(), 1);
        assert!(outcome.output_files[0].exists());
    }

    #[test]
    fn empty_side_channel_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = testutil::config(
            testutil::inline_source(&[], &[], &["CONTRATO"]),
            testutil::inline_source(&[], &[], &["CONTRATO"]),
        );
        let env = StageEnv {
            config: &config,
            base_dir: dir.path(),
        };
        let mut ctx = RunContext::new(
            "acme",
            dir.path().to_path_buf(),
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        );
        let outcome = Enriquecimento.process(&env, &mut ctx).unwrap();
        assert!(outcome.output_files.is_empty());
        assert_eq!(outcome.metadata.get("demoted_rows").map(String::as_str), Some("0"));
    }
}
