//! Duplicate-priority tie-break.
//!
//! Runs before the anti-join when the client side can carry several rows
//! per key. One row per key survives as primary; the rest are demoted to an
//! enrichment side-channel annotated with the primary's key and a reason.

use std::collections::BTreeMap;

use tracing::debug;

use recon_model::{Dataset, DocumentKind, Record};

/// Enrichment column carrying the key of the primary row a demoted row
/// lost to.
pub const REFERENCE_KEY_COLUMN: &str = "CHAVE_REF";

/// Enrichment column carrying the demotion reason.
pub const REASON_COLUMN: &str = "MOTIVO";

pub const REASON_DUPLICATE_LEGAL: &str = "DUPLICATE_LEGAL_ID";
pub const REASON_ADDITIONAL_PERSONAL: &str = "ADDITIONAL_PERSONAL_ID";
pub const REASON_ADDITIONAL_DOCUMENT: &str = "ADDITIONAL_DOCUMENT";

/// Primaries plus the demoted side-channel.
#[derive(Debug, Clone, Default)]
pub struct DedupeOutcome {
    pub primary: Dataset,
    pub enrichment: Dataset,
}

/// Collapse duplicate keys to one primary row per key.
///
/// Candidates for a key are ranked by document-type priority (legal-entity
/// tax IDs outrank personal IDs outrank everything else), then by most
/// recent reference date; equal rank keeps input order. Rows with empty
/// keys never group and always stay primary.
pub fn dedupe_by_priority(
    dataset: Dataset,
    key_column: &str,
    document_column: &str,
    reference_date_column: &str,
) -> DedupeOutcome {
    let mut primary = dataset.empty_like();
    let mut enrichment = dataset.empty_like();
    enrichment.add_column(REFERENCE_KEY_COLUMN);
    enrichment.add_column(REASON_COLUMN);

    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in dataset.take_rows() {
        let key = row.trimmed(key_column).to_string();
        if key.is_empty() {
            primary.push_row(row);
            continue;
        }
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(row);
    }

    let mut demoted_total = 0usize;
    for key in order {
        let Some(mut rows) = groups.remove(&key) else {
            continue;
        };
        rows.sort_by(|a, b| {
            let rank_a = document_rank(a, document_column);
            let rank_b = document_rank(b, document_column);
            rank_a.cmp(&rank_b).then_with(|| {
                // More recent reference date first; unparsable dates last.
                let date_a = a.date(reference_date_column);
                let date_b = b.date(reference_date_column);
                match (date_a, date_b) {
                    (Some(a), Some(b)) => b.cmp(&a),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            })
        });
        let mut rows = rows.into_iter();
        let Some(winner) = rows.next() else {
            continue;
        };
        let winner_kind = DocumentKind::classify(winner.trimmed(document_column));
        for mut loser in rows {
            let loser_kind = DocumentKind::classify(loser.trimmed(document_column));
            loser.set(REFERENCE_KEY_COLUMN, key.clone());
            loser.set(REASON_COLUMN, demotion_reason(winner_kind, loser_kind));
            enrichment.push_row(loser);
            demoted_total += 1;
        }
        primary.push_row(winner);
    }
    debug!(
        primary = primary.len(),
        demoted = demoted_total,
        "duplicate-priority applied"
    );
    DedupeOutcome {
        primary,
        enrichment,
    }
}

fn document_rank(row: &Record, document_column: &str) -> u8 {
    DocumentKind::classify(row.trimmed(document_column)).priority()
}

/// A demoted row duplicating the winner's document type is a true
/// duplicate; a row of a different type is an additional document for the
/// same key.
fn demotion_reason(winner: DocumentKind, loser: DocumentKind) -> &'static str {
    match (winner, loser) {
        (DocumentKind::LegalEntity, DocumentKind::LegalEntity) => REASON_DUPLICATE_LEGAL,
        (DocumentKind::Person, DocumentKind::Person) => REASON_ADDITIONAL_PERSONAL,
        _ => REASON_ADDITIONAL_DOCUMENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: &str, doc: &str, date: &str) -> Record {
        Record::from_pairs([
            ("CHAVE", key),
            ("DOCUMENTO", doc),
            ("DATA_REFERENCIA", date),
        ])
    }

    fn dedupe(rows: Vec<Record>) -> DedupeOutcome {
        let mut dataset = Dataset::new(["CHAVE", "DOCUMENTO", "DATA_REFERENCIA"]);
        for row in rows {
            dataset.push_row(row);
        }
        dedupe_by_priority(dataset, "CHAVE", "DOCUMENTO", "DATA_REFERENCIA")
    }

    #[test]
    fn legal_entity_outranks_person_regardless_of_order() {
        for rows in [
            vec![
                row("K1", "12345678909", "2024-01-01"),
                row("K1", "12345678000195", "2023-01-01"),
            ],
            vec![
                row("K1", "12345678000195", "2023-01-01"),
                row("K1", "12345678909", "2024-01-01"),
            ],
        ] {
            let outcome = dedupe(rows);
            assert_eq!(outcome.primary.len(), 1);
            assert_eq!(
                outcome.primary.rows()[0].trimmed("DOCUMENTO"),
                "12345678000195"
            );
            assert_eq!(outcome.enrichment.len(), 1);
            let demoted = &outcome.enrichment.rows()[0];
            assert_eq!(demoted.trimmed(REFERENCE_KEY_COLUMN), "K1");
            assert_eq!(demoted.trimmed(REASON_COLUMN), REASON_ADDITIONAL_DOCUMENT);
        }
    }

    #[test]
    fn equal_priority_breaks_tie_on_most_recent_date() {
        let outcome = dedupe(vec![
            row("K1", "12345678909", "2023-06-01"),
            row("K1", "98765432100", "2024-06-01"),
        ]);
        assert_eq!(
            outcome.primary.rows()[0].trimmed("DOCUMENTO"),
            "98765432100"
        );
        assert_eq!(
            outcome.enrichment.rows()[0].trimmed(REASON_COLUMN),
            REASON_ADDITIONAL_PERSONAL
        );
    }

    #[test]
    fn duplicate_legal_entities_are_flagged_as_duplicates() {
        let outcome = dedupe(vec![
            row("K1", "12345678000195", "2024-01-01"),
            row("K1", "99887766000155", "2023-01-01"),
        ]);
        assert_eq!(
            outcome.enrichment.rows()[0].trimmed(REASON_COLUMN),
            REASON_DUPLICATE_LEGAL
        );
    }

    #[test]
    fn equal_rank_and_date_keeps_input_order() {
        let outcome = dedupe(vec![
            row("K1", "12345678909", "2024-01-01"),
            row("K1", "98765432100", "2024-01-01"),
        ]);
        assert_eq!(
            outcome.primary.rows()[0].trimmed("DOCUMENTO"),
            "12345678909"
        );
    }

    #[test]
    fn unparsable_date_loses_to_any_date() {
        let outcome = dedupe(vec![
            row("K1", "12345678909", ""),
            row("K1", "98765432100", "2020-01-01"),
        ]);
        assert_eq!(
            outcome.primary.rows()[0].trimmed("DOCUMENTO"),
            "98765432100"
        );
    }

    #[test]
    fn empty_keys_never_group() {
        let outcome = dedupe(vec![
            row("", "12345678909", "2024-01-01"),
            row("", "98765432100", "2024-01-01"),
        ]);
        assert_eq!(outcome.primary.len(), 2);
        assert!(outcome.enrichment.is_empty());
    }

    #[test]
    fn distinct_keys_are_untouched() {
        let outcome = dedupe(vec![
            row("K1", "12345678909", "2024-01-01"),
            row("K2", "98765432100", "2024-01-01"),
        ]);
        assert_eq!(outcome.primary.len(), 2);
        assert!(outcome.enrichment.is_empty());
    }
}
