//! Batimento: the client − ledger anti-join.
//!
//! Order of operations: duplicate-priority dedupe on the client side (the
//! demoted rows accumulate on the run's enrichment side-channel), then the
//! anti-join, campaign classification with the contract override, the
//! optional reallocation lookup, and finally one export per
//! (campaign, splitter bucket) pair.

use std::collections::BTreeMap;

use tracing::info;

use recon_config::BatimentoParams;
use recon_model::{Dataset, Result, RunContext, StageOutcome};

use crate::antijoin::subtract;
use crate::campaign::{apply_reallocation, build_reallocation_membership, classify_campaigns};
use crate::priority::dedupe_by_priority;
use crate::split::run_splitters;

use super::{StageEnv, StageProcessor, export_stage};

pub struct Batimento {
    pub params: BatimentoParams,
}

impl StageProcessor for Batimento {
    fn name(&self) -> &'static str {
        "batimento"
    }

    fn process(&self, env: &StageEnv<'_>, ctx: &mut RunContext) -> Result<StageOutcome> {
        let mut outcome = StageOutcome::default();
        let client_key = env.config.client_source.key.output_column().to_string();
        let ledger_key = env.config.max_source.key.output_column().to_string();

        let deduped = dedupe_by_priority(
            std::mem::take(&mut ctx.client_data),
            &client_key,
            &self.params.document_column,
            &self.params.reference_date_column,
        );
        ctx.client_data = deduped.primary;
        outcome.metadata.insert(
            "demoted_duplicates".to_string(),
            deduped.enrichment.len().to_string(),
        );
        ctx.enrichment.append(deduped.enrichment);

        let mut unmatched = subtract(&ctx.client_data, &client_key, &ctx.ledger_data, &ledger_key)?;
        classify_campaigns(&mut unmatched, &self.params, ctx.reference_date);

        if let Some(realloc) = &self.params.reallocation {
            let membership =
                build_reallocation_membership(realloc, env.base_dir, &env.config.global)?;
            let moved = apply_reallocation(
                &mut unmatched,
                &membership,
                &realloc.document_column,
                &self.params.campaign_column,
                &realloc.campaign,
            );
            outcome
                .metadata
                .insert("reallocated".to_string(), moved.to_string());
        }

        for (campaign, dataset) in by_campaign(&unmatched, &self.params.campaign_column) {
            outcome
                .metadata
                .insert(format!("campaign_{campaign}"), dataset.len().to_string());
            let (splits, errors) = run_splitters(
                &env.config.client_source.splitters,
                dataset,
                &env.config.client_source.default_bucket,
                env.base_dir,
                env.config.global.encoding,
            );
            outcome.errors.extend(errors);
            for (bucket, bucket_data) in &splits.splits {
                let path = export_stage(
                    env,
                    ctx,
                    env.config.client_source.export.as_ref(),
                    self.name(),
                    &[campaign.as_str(), bucket.as_str()],
                    bucket_data,
                )?;
                outcome.output_files.push(path);
            }
        }

        info!(
            unmatched = unmatched.len(),
            artifacts = outcome.output_files.len(),
            "batimento complete"
        );
        outcome
            .metadata
            .insert("unmatched".to_string(), unmatched.len().to_string());
        ctx.register_files(outcome.output_files.clone());
        outcome.data = unmatched;
        Ok(outcome)
    }
}

/// Group rows by their campaign label, preserving row order within each
/// group.
fn by_campaign(dataset: &Dataset, campaign_column: &str) -> BTreeMap<String, Dataset> {
    let mut groups: BTreeMap<String, Dataset> = BTreeMap::new();
    for row in dataset.rows() {
        let label = row.trimmed(campaign_column).to_string();
        groups
            .entry(label)
            .or_insert_with(|| dataset.empty_like())
            .push_row(row.clone());
    }
    groups
}
