//! Delimited text loading into the dynamic dataset model.

use std::collections::BTreeMap;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::debug;

use recon_config::{GlobalConfig, LoaderConfig, TextEncoding};
use recon_model::{Dataset, LoadResult, Record, normalize_column};

use crate::container::read_payload;
use crate::error::{IngestError, Result};

/// Decode payload bytes according to the configured encoding. UTF-8 input
/// may carry a byte-order marker; latin-1 covers the legacy exports.
pub(crate) fn decode(payload: &[u8], encoding: TextEncoding) -> String {
    let (text, _, _) = match encoding {
        TextEncoding::Utf8Bom => encoding_rs::UTF_8.decode(payload),
        TextEncoding::Latin1 => encoding_rs::WINDOWS_1252.decode(payload),
    };
    text.into_owned()
}

/// Parse decoded delimited text into a dataset. The first row is the
/// header; headers are normalized and short rows are padded with empties.
pub fn parse_delimited(text: &str, separator: char, origin: &Path) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(separator as u8)
        .from_reader(text.as_bytes());

    let mut headers: Vec<String> = Vec::new();
    let mut dataset = Dataset::default();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if headers.is_empty() {
            headers = record.iter().map(normalize_column).collect();
            if headers.iter().all(String::is_empty) {
                return Err(IngestError::NoHeader {
                    path: origin.to_path_buf(),
                });
            }
            dataset = Dataset::new(headers.iter().filter(|name| !name.is_empty()));
            continue;
        }
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row = Record::new();
        for (index, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let cell = record.get(index).unwrap_or("");
            row.set(header, cell.trim().trim_matches('\u{feff}'));
        }
        dataset.push_row(row);
    }
    if headers.is_empty() {
        return Err(IngestError::NoHeader {
            path: origin.to_path_buf(),
        });
    }
    Ok(dataset)
}

/// Load a dataset per the loader configuration. Relative paths resolve
/// against `base_dir`; failures come back as `metadata["error"]`.
pub fn load_source(loader: &LoaderConfig, base_dir: &Path, global: &GlobalConfig) -> LoadResult {
    match loader {
        LoaderConfig::Csv {
            path,
            separator,
            encoding,
        } => {
            let resolved = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            let separator = separator.unwrap_or(global.separator);
            let encoding = encoding.unwrap_or(global.encoding);
            match load_delimited_file(&resolved, separator, encoding) {
                Ok(data) => {
                    debug!(
                        path = %resolved.display(),
                        records = data.len(),
                        columns = data.columns().len(),
                        "loaded delimited source"
                    );
                    let mut metadata = BTreeMap::new();
                    metadata.insert("source_path".to_string(), resolved.display().to_string());
                    metadata.insert("record_count".to_string(), data.len().to_string());
                    LoadResult { data, metadata }
                }
                Err(error) => {
                    debug!(path = %resolved.display(), %error, "loader failed");
                    LoadResult::failed(error.to_string())
                }
            }
        }
        LoaderConfig::Inline { columns, rows } => {
            let mut data = Dataset::new(columns.iter().map(String::as_str));
            let column_names: Vec<String> = data.columns().to_vec();
            for cells in rows {
                let mut row = Record::new();
                for (name, cell) in column_names.iter().zip(cells.iter()) {
                    row.set(name, cell.clone());
                }
                data.push_row(row);
            }
            let mut metadata = BTreeMap::new();
            metadata.insert("source_path".to_string(), "inline".to_string());
            metadata.insert("record_count".to_string(), data.len().to_string());
            LoadResult { data, metadata }
        }
    }
}

fn load_delimited_file(path: &Path, separator: char, encoding: TextEncoding) -> Result<Dataset> {
    let payload = read_payload(path)?;
    let text = decode(&payload, encoding);
    parse_delimited(&text, separator, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> GlobalConfig {
        GlobalConfig::default()
    }

    #[test]
    fn parses_semicolon_delimited_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.csv");
        std::fs::write(&path, "\u{feff}contrato;valor\nC1;10,50\nC2;20\n").unwrap();

        let loader = LoaderConfig::Csv {
            path: path.clone(),
            separator: None,
            encoding: None,
        };
        let result = load_source(&loader, dir.path(), &global());
        assert!(result.error().is_none());
        assert_eq!(result.data.len(), 2);
        assert!(result.data.has_column("CONTRATO"));
        assert_eq!(result.data.rows()[0].number("VALOR"), Some(10.5));
    }

    #[test]
    fn latin1_payload_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dados.csv");
        // "SITUAÇÃO" in windows-1252 bytes.
        let mut payload = b"SITUA\xC7\xC3O;N\n".to_vec();
        payload.extend_from_slice(b"ABERTA;1\n");
        std::fs::write(&path, payload).unwrap();

        let loader = LoaderConfig::Csv {
            path,
            separator: Some(';'),
            encoding: Some(TextEncoding::Latin1),
        };
        let result = load_source(&loader, dir.path(), &global());
        assert!(result.error().is_none());
        assert!(result.data.has_column("SITUAÇÃO"));
    }

    #[test]
    fn missing_file_surfaces_as_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let loader = LoaderConfig::Csv {
            path: dir.path().join("nao_existe.csv"),
            separator: None,
            encoding: None,
        };
        let result = load_source(&loader, dir.path(), &global());
        assert!(result.error().is_some());
        assert!(result.data.is_empty());
    }

    #[test]
    fn inline_loader_builds_dataset() {
        let loader = LoaderConfig::Inline {
            columns: vec!["A".to_string(), "B".to_string()],
            rows: vec![vec!["1".to_string(), "2".to_string()]],
        };
        let result = load_source(&loader, Path::new("."), &global());
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data.rows()[0].trimmed("B"), "2");
    }

    #[test]
    fn short_rows_are_padded() {
        let dataset = parse_delimited("A;B;C\n1;2\n", ';', Path::new("mem")).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows()[0].trimmed("C"), "");
    }
}
