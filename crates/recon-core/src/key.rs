//! Canonical join-key derivation.
//!
//! Key generation is pure and order-independent within a dataset pass: two
//! logically equal source records always yield the same key. When none of
//! the configured source columns exist (or every segment cleanses to
//! nothing), the key is the empty string; empty keys are never considered
//! equal to each other downstream, so such rows always come out unmatched.

use recon_config::KeyConfig;
use recon_model::Dataset;

/// Cleanse a composite-key segment: keep alphanumerics only, upper-cased.
pub fn cleanse_component(value: &str) -> String {
    value
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .collect::<String>()
        .to_uppercase()
}

/// Normalize a reused-column key: trim, upper-case, strip everything that
/// is not alphanumeric or a hyphen.
pub fn normalize_key(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '-')
        .collect::<String>()
        .to_uppercase()
}

/// Derive the key column for every row per the configured strategy.
pub fn generate_keys(dataset: &mut Dataset, key: &KeyConfig) {
    match key {
        KeyConfig::Composite {
            components,
            separator,
            output_column,
        } => {
            dataset.add_column(output_column);
            let components = components.clone();
            let separator = separator.clone();
            let output_column = output_column.clone();
            dataset.map_rows(|row| {
                let segments: Vec<String> = components
                    .iter()
                    .map(|component| cleanse_component(row.trimmed(component)))
                    .collect();
                // All-empty segments would produce a bare-separator key that
                // spuriously matches other degenerate rows; collapse to empty.
                let value = if segments.iter().all(String::is_empty) {
                    String::new()
                } else {
                    segments.join(&separator)
                };
                row.set(&output_column, value);
            });
        }
        KeyConfig::Column {
            column,
            output_column,
        } => {
            dataset.add_column(output_column);
            let column = column.clone();
            let output_column = output_column.clone();
            dataset.map_rows(|row| {
                let value = normalize_key(row.trimmed(&column));
                row.set(&output_column, value);
            });
        }
    }
}
