//! Aging-based campaign classification, the contract override, and the
//! reallocation lookup.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use regex::RegexBuilder;
use tracing::{debug, warn};

use recon_config::{BatimentoParams, GlobalConfig, ReallocationParams};
use recon_model::{Dataset, ReconError, Record, Result, clean_document};

/// Days between the due date and the run's reference date, floored at
/// zero. `None` when the due date is absent or unparsable.
fn due_age_days(row: &Record, due_date_column: &str, reference_date: NaiveDate) -> Option<i64> {
    row.date(due_date_column)
        .map(|due| (reference_date - due).num_days().max(0))
}

/// Assign every row to one of the two aging campaigns, then apply the
/// contract override: a contract with installments on both sides of the
/// threshold is forced entirely into the lower-threshold campaign.
///
/// Rows with an undefined age land in the high campaign unless the
/// override pulls their contract low.
pub fn classify_campaigns(
    dataset: &mut Dataset,
    params: &BatimentoParams,
    reference_date: NaiveDate,
) {
    dataset.add_column(&params.campaign_column);

    let mut low_contracts: BTreeSet<String> = BTreeSet::new();
    let mut high_contracts: BTreeSet<String> = BTreeSet::new();
    let contract_columns = params.contract_key_columns.clone();
    let campaign_column = params.campaign_column.clone();
    let due_date_column = params.due_date_column.clone();
    let threshold = params.aging_threshold_days;
    let low = params.campaign_low.clone();
    let high = params.campaign_high.clone();

    dataset.map_rows(|row| {
        let is_low = due_age_days(row, &due_date_column, reference_date)
            .is_some_and(|age| age <= threshold);
        row.set(&campaign_column, if is_low { low.as_str() } else { high.as_str() });
        let contract = contract_key(row, &contract_columns);
        if !contract.is_empty() {
            if is_low {
                low_contracts.insert(contract);
            } else {
                high_contracts.insert(contract);
            }
        }
    });

    let mixed: BTreeSet<String> = low_contracts
        .intersection(&high_contracts)
        .cloned()
        .collect();
    if mixed.is_empty() {
        return;
    }
    let mut overridden = 0usize;
    dataset.map_rows(|row| {
        let contract = contract_key(row, &contract_columns);
        if !contract.is_empty()
            && mixed.contains(&contract)
            && row.trimmed(&campaign_column) != low
        {
            row.set(&campaign_column, low.clone());
            overridden += 1;
        }
    });
    debug!(
        contracts = mixed.len(),
        rows = overridden,
        "campaign override applied"
    );
}

/// Contract-level grouping key: trimmed values of the configured columns
/// joined with `|`. Empty when every component is blank.
fn contract_key(row: &Record, columns: &[String]) -> String {
    let segments: Vec<&str> = columns.iter().map(|column| row.trimmed(column)).collect();
    if segments.iter().all(|segment| segment.is_empty()) {
        String::new()
    } else {
        segments.join("|")
    }
}

/// Build the reallocation membership set: cleaned documents of snapshot
/// rows whose campaign label carries the tag and whose status is open.
pub fn build_reallocation_membership(
    params: &ReallocationParams,
    base_dir: &Path,
    global: &GlobalConfig,
) -> Result<BTreeSet<String>> {
    let loaded = recon_ingest::load_source(&params.snapshot, base_dir, global);
    if let Some(error) = loaded.error() {
        return Err(ReconError::Loader {
            path: base_dir.to_path_buf(),
            message: format!("reallocation snapshot: {error}"),
        });
    }
    let tag = RegexBuilder::new(&params.tag_pattern)
        .case_insensitive(true)
        .build()
        .map_err(|error| ReconError::Config(format!("reallocation tag pattern: {error}")))?;
    let open: BTreeSet<String> = params
        .open_statuses
        .iter()
        .map(|status| status.trim().to_uppercase())
        .collect();

    let mut membership = BTreeSet::new();
    for row in loaded.data.rows() {
        if !tag.is_match(row.trimmed(&params.label_column)) {
            continue;
        }
        if !open.contains(&row.trimmed(&params.status_column).to_uppercase()) {
            continue;
        }
        let document = clean_document(row.trimmed(&params.document_column));
        if !document.is_empty() {
            membership.insert(document);
        }
    }
    if membership.is_empty() {
        warn!("reallocation membership set is empty");
    }
    Ok(membership)
}

/// Relabel member rows into the reallocation campaign. Never adds or
/// removes rows.
pub fn apply_reallocation(
    dataset: &mut Dataset,
    membership: &BTreeSet<String>,
    document_column: &str,
    campaign_column: &str,
    campaign: &str,
) -> usize {
    let mut moved = 0usize;
    let document_column = document_column.to_string();
    let campaign_column = campaign_column.to_string();
    let campaign = campaign.to_string();
    dataset.map_rows(|row| {
        let document = clean_document(row.trimmed(&document_column));
        if !document.is_empty() && membership.contains(&document) {
            row.set(&campaign_column, campaign.clone());
            moved += 1;
        }
    });
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_config::LoaderConfig;

    fn params() -> BatimentoParams {
        BatimentoParams::default()
    }

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn row(contract: &str, due: &str) -> Record {
        Record::from_pairs([("CONTRATO", contract), ("VENCIMENTO", due)])
    }

    fn labels(dataset: &Dataset) -> Vec<&str> {
        dataset.rows().iter().map(|r| r.trimmed("CAMPANHA")).collect()
    }

    #[test]
    fn splits_at_threshold_inclusive() {
        let mut dataset = Dataset::new(["CONTRATO", "VENCIMENTO"]);
        // 1800 days before the reference date sits exactly on the threshold.
        dataset.push_row(row("C1", "2019-06-28"));
        dataset.push_row(row("C2", "2019-06-27"));
        classify_campaigns(&mut dataset, &params(), reference());
        assert_eq!(labels(&dataset), vec!["CAMPANHA_RECENTE", "CAMPANHA_ANTIGA"]);
    }

    #[test]
    fn mixed_contract_is_forced_into_low_campaign() {
        let mut dataset = Dataset::new(["CONTRATO", "VENCIMENTO"]);
        // Ages 1500 and 2000 days against the 1800-day threshold.
        dataset.push_row(row("C1", "2020-04-23"));
        dataset.push_row(row("C1", "2018-12-10"));
        dataset.push_row(row("C2", "2018-12-10"));
        classify_campaigns(&mut dataset, &params(), reference());
        assert_eq!(
            labels(&dataset),
            vec!["CAMPANHA_RECENTE", "CAMPANHA_RECENTE", "CAMPANHA_ANTIGA"]
        );
    }

    #[test]
    fn null_due_date_lands_high_unless_contract_pulls_low() {
        let mut dataset = Dataset::new(["CONTRATO", "VENCIMENTO"]);
        dataset.push_row(row("C1", ""));
        dataset.push_row(row("C2", ""));
        dataset.push_row(row("C2", "2024-05-01"));
        classify_campaigns(&mut dataset, &params(), reference());
        assert_eq!(
            labels(&dataset),
            vec!["CAMPANHA_ANTIGA", "CAMPANHA_RECENTE", "CAMPANHA_RECENTE"]
        );
    }

    #[test]
    fn future_due_dates_floor_to_age_zero() {
        let mut dataset = Dataset::new(["CONTRATO", "VENCIMENTO"]);
        dataset.push_row(row("C1", "2030-01-01"));
        classify_campaigns(&mut dataset, &params(), reference());
        assert_eq!(labels(&dataset), vec!["CAMPANHA_RECENTE"]);
    }

    #[test]
    fn blank_contract_rows_skip_the_override() {
        let mut dataset = Dataset::new(["CONTRATO", "VENCIMENTO"]);
        dataset.push_row(row("", "2024-05-01"));
        dataset.push_row(row("", "2010-01-01"));
        classify_campaigns(&mut dataset, &params(), reference());
        assert_eq!(labels(&dataset), vec!["CAMPANHA_RECENTE", "CAMPANHA_ANTIGA"]);
    }

    #[test]
    fn membership_filters_by_tag_and_open_status() {
        let snapshot = LoaderConfig::Inline {
            columns: vec![
                "CAMPANHA_ATUAL".to_string(),
                "STATUS".to_string(),
                "CPFCNPJ".to_string(),
            ],
            rows: vec![
                vec![
                    "Mutirão Julho".to_string(),
                    "ABERTO".to_string(),
                    "123.456.789-09".to_string(),
                ],
                vec![
                    "Mutirão Julho".to_string(),
                    "QUITADO".to_string(),
                    "98765432100".to_string(),
                ],
                vec![
                    "Campanha Normal".to_string(),
                    "ABERTO".to_string(),
                    "11122233344".to_string(),
                ],
            ],
        };
        let realloc = ReallocationParams {
            campaign: "MUTIRAO".to_string(),
            snapshot,
            label_column: "CAMPANHA_ATUAL".to_string(),
            tag_pattern: "mutir".to_string(),
            status_column: "STATUS".to_string(),
            open_statuses: vec!["ABERTO".to_string()],
            document_column: "CPFCNPJ".to_string(),
        };
        let membership =
            build_reallocation_membership(&realloc, Path::new("."), &GlobalConfig::default())
                .unwrap();
        assert_eq!(membership.len(), 1);
        assert!(membership.contains("12345678909"));
    }

    #[test]
    fn reallocation_only_relabels_member_rows() {
        let mut dataset = Dataset::new(["DOCUMENTO", "CAMPANHA"]);
        dataset.push_row(Record::from_pairs([
            ("DOCUMENTO", "123.456.789-09"),
            ("CAMPANHA", "CAMPANHA_ANTIGA"),
        ]));
        dataset.push_row(Record::from_pairs([
            ("DOCUMENTO", "98765432100"),
            ("CAMPANHA", "CAMPANHA_ANTIGA"),
        ]));
        let membership: BTreeSet<String> = ["12345678909".to_string()].into_iter().collect();
        let moved =
            apply_reallocation(&mut dataset, &membership, "DOCUMENTO", "CAMPANHA", "MUTIRAO");
        assert_eq!(moved, 1);
        assert_eq!(dataset.rows()[0].trimmed("CAMPANHA"), "MUTIRAO");
        assert_eq!(dataset.rows()[1].trimmed("CAMPANHA"), "CAMPANHA_ANTIGA");
    }
}
