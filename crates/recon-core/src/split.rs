//! Splitter chain: routing rows into named buckets.
//!
//! Splitters run in declared order and each one only sees the rows earlier
//! splitters did not claim. Whatever is left at the end lands in the
//! configured default bucket. Buckets partition the input: no row is lost
//! or duplicated.

use std::path::Path;

use tracing::debug;

use recon_config::{SplitterConfig, TextEncoding};
use recon_model::{Dataset, SplitOutcome, clean_document};

/// Run the splitter chain. Roster I/O failures disable the failing
/// splitter (its rows flow on unclaimed) and surface as findings.
pub fn run_splitters(
    configs: &[SplitterConfig],
    dataset: Dataset,
    default_bucket: &str,
    base_dir: &Path,
    encoding: TextEncoding,
) -> (SplitOutcome, Vec<String>) {
    let mut outcome = SplitOutcome::default();
    let mut errors = Vec::new();
    let mut remaining = dataset;

    for config in configs {
        if remaining.is_empty() {
            break;
        }
        match config {
            SplitterConfig::Judicial {
                roster_path,
                document_column,
                roster_column,
                judicial_bucket,
                extrajudicial_bucket,
            } => {
                let resolved = if roster_path.is_absolute() {
                    roster_path.clone()
                } else {
                    base_dir.join(roster_path)
                };
                let roster = match recon_ingest::load_document_roster(
                    &resolved,
                    roster_column.as_deref(),
                    encoding,
                ) {
                    Ok(roster) => roster,
                    Err(error) => {
                        errors.push(format!("judicial: {error}"));
                        continue;
                    }
                };
                // Judicial is terminal: every remaining row lands on one of
                // the two legal tracks.
                let (judicial, extrajudicial) = remaining.partition(|row| {
                    roster.contains(&clean_document(row.trimmed(document_column)))
                });
                add_bucket(&mut outcome, judicial_bucket, judicial);
                add_bucket(&mut outcome, extrajudicial_bucket, extrajudicial);
                remaining = Dataset::default();
            }
            SplitterConfig::Campaign {
                column,
                pattern,
                bucket,
            } => match regex::Regex::new(pattern) {
                Ok(regex) => {
                    let (claimed, rest) =
                        remaining.partition(|row| regex.is_match(row.trimmed(column)));
                    add_bucket(&mut outcome, bucket, claimed);
                    remaining = rest;
                }
                Err(error) => errors.push(format!("campaign: {error}")),
            },
            SplitterConfig::FieldValue { column, buckets } => {
                for (value, bucket) in buckets {
                    let wanted = value.trim().to_uppercase();
                    let (claimed, rest) = remaining
                        .partition(|row| row.trimmed(column).to_uppercase() == wanted);
                    add_bucket(&mut outcome, bucket, claimed);
                    remaining = rest;
                }
            }
        }
    }

    if !remaining.is_empty() {
        add_bucket(&mut outcome, default_bucket, remaining);
    }
    debug!(
        buckets = outcome.splits.len(),
        rows = outcome.total_rows(),
        "splitters applied"
    );
    (outcome, errors)
}

fn add_bucket(outcome: &mut SplitOutcome, name: &str, dataset: Dataset) {
    if dataset.is_empty() {
        return;
    }
    match outcome.splits.get_mut(name) {
        Some(existing) => existing.append(dataset),
        None => {
            outcome.splits.insert(name.to_string(), dataset);
        }
    }
}
