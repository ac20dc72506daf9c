//! Baixa: write-off candidates.
//!
//! Same direction as devolução (ledger − client), additionally enriched
//! with payment-receipt data looked up in the client snapshot by cleaned
//! document, since the candidate's key is by definition absent from the
//! client side.

use std::collections::BTreeMap;

use tracing::info;

use recon_config::BaixaParams;
use recon_model::{Dataset, Record, Result, RunContext, StageOutcome, clean_document};

use crate::antijoin::subtract;

use super::{StageEnv, StageProcessor, export_stage};

pub struct Baixa {
    pub params: BaixaParams,
}

impl StageProcessor for Baixa {
    fn name(&self) -> &'static str {
        "baixa"
    }

    fn process(&self, env: &StageEnv<'_>, ctx: &mut RunContext) -> Result<StageOutcome> {
        let client_key = env.config.client_source.key.output_column();
        let ledger_key = env.config.max_source.key.output_column();

        let mut writeoffs =
            subtract(&ctx.ledger_data, ledger_key, &ctx.client_data, client_key)?;
        let enriched = self.enrich_receipts(&mut writeoffs, &ctx.client_data);

        let mut outcome = StageOutcome::default();
        outcome.metadata.insert(
            "writeoff_candidates".to_string(),
            writeoffs.len().to_string(),
        );
        outcome
            .metadata
            .insert("receipt_enriched".to_string(), enriched.to_string());
        if !writeoffs.is_empty() {
            let path = export_stage(
                env,
                ctx,
                env.config.max_source.export.as_ref(),
                self.name(),
                &[],
                &writeoffs,
            )?;
            outcome.output_files.push(path);
        }
        info!(
            candidates = writeoffs.len(),
            enriched, "baixa complete"
        );
        ctx.register_files(outcome.output_files.clone());
        outcome.data = writeoffs;
        Ok(outcome)
    }
}

impl Baixa {
    /// Copy the configured receipt columns from the client snapshot into
    /// blank cells of the write-off rows, matching by cleaned document.
    /// Returns the number of rows that received at least one value.
    fn enrich_receipts(&self, writeoffs: &mut Dataset, client: &Dataset) -> usize {
        if self.params.receipt_columns.is_empty() {
            return 0;
        }
        for column in &self.params.receipt_columns {
            writeoffs.add_column(column);
        }
        let document_column = self.params.document_column.as_str();
        let mut by_document: BTreeMap<String, &Record> = BTreeMap::new();
        for row in client.rows() {
            let document = clean_document(row.trimmed(document_column));
            if !document.is_empty() {
                by_document.entry(document).or_insert(row);
            }
        }
        let mut enriched = 0usize;
        let receipt_columns = self.params.receipt_columns.clone();
        writeoffs.map_rows(|row| {
            let document = clean_document(row.trimmed(document_column));
            let Some(source) = by_document.get(&document) else {
                return;
            };
            let mut touched = false;
            for column in &receipt_columns {
                if row.is_blank(column) && !source.is_blank(column) {
                    row.set(column, source.trimmed(column));
                    touched = true;
                }
            }
            if touched {
                enriched += 1;
            }
        });
        enriched
    }
}
