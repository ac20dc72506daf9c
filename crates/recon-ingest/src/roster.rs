//! Document roster loading for the blacklist validator and the judicial
//! splitter.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;

use recon_config::TextEncoding;
use recon_model::{Dataset, clean_document, digits_only, normalize_column};

use crate::container::read_payload;
use crate::delimited::{decode, parse_delimited};
use crate::error::Result;

/// Share of non-empty values that must look like a CPF/CNPJ for a column to
/// be picked as the document column.
const PLAUSIBLE_RATIO: f64 = 0.6;

/// Load an external CPF/CNPJ roster into a digits-normalized set.
///
/// Uses `preferred_column` when the file has it; otherwise scans for the
/// first column whose values look document-like, falling back to the first
/// column. Container, encoding, and separator handling match the regular
/// loaders.
pub fn load_document_roster(
    path: &Path,
    preferred_column: Option<&str>,
    encoding: TextEncoding,
) -> Result<BTreeSet<String>> {
    let payload = read_payload(path)?;
    let text = decode(&payload, encoding);
    let separator = sniff_separator(&text);
    let dataset = parse_delimited(&text, separator, path)?;

    let column = choose_column(&dataset, preferred_column);
    let mut roster = BTreeSet::new();
    if let Some(column) = column {
        for row in dataset.rows() {
            let document = clean_document(row.trimmed(&column));
            if !document.is_empty() {
                roster.insert(document);
            }
        }
        debug!(
            path = %path.display(),
            column = %column,
            documents = roster.len(),
            "loaded document roster"
        );
    }
    Ok(roster)
}

fn sniff_separator(text: &str) -> char {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.contains(';') { ';' } else { ',' }
}

fn choose_column(dataset: &Dataset, preferred: Option<&str>) -> Option<String> {
    if let Some(preferred) = preferred {
        let normalized = normalize_column(preferred);
        if dataset.has_column(&normalized) {
            return Some(normalized);
        }
    }
    for column in dataset.columns() {
        if is_document_column(dataset, column) {
            return Some(column.clone());
        }
    }
    dataset.columns().first().cloned()
}

fn is_document_column(dataset: &Dataset, column: &str) -> bool {
    let mut non_empty = 0usize;
    let mut plausible = 0usize;
    for row in dataset.rows() {
        let value = row.trimmed(column);
        if value.is_empty() {
            continue;
        }
        non_empty += 1;
        let digits = digits_only(value).len();
        if digits == 11 || digits == 14 {
            plausible += 1;
        }
    }
    non_empty > 0 && (plausible as f64 / non_empty as f64) >= PLAUSIBLE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_column_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(&path, "NOME;CPF\nFulano;123.456.789-09\n").unwrap();
        let roster = load_document_roster(&path, Some("cpf"), TextEncoding::Utf8Bom).unwrap();
        assert!(roster.contains("12345678909"));
    }

    #[test]
    fn plausible_column_detected_without_hint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        std::fs::write(
            &path,
            "NOME,DOC\nFulano,12345678909\nBeltrano,12.345.678/0001-90\n",
        )
        .unwrap();
        let roster = load_document_roster(&path, Some("CNPJ"), TextEncoding::Utf8Bom).unwrap();
        assert_eq!(roster.len(), 2);
        assert!(roster.contains("12345678000190"));
    }

    #[test]
    fn latin1_roster_header_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        // "INSCRIÇÃO" in windows-1252 bytes.
        let mut payload = b"INSCRI\xC7\xC3O\n".to_vec();
        payload.extend_from_slice(b"123.456.789-09\n");
        std::fs::write(&path, payload).unwrap();

        let roster =
            load_document_roster(&path, Some("INSCRIÇÃO"), TextEncoding::Latin1).unwrap();
        assert!(roster.contains("12345678909"));
    }
}
