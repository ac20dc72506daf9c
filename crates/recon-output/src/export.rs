use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use recon_config::{ExportFormat, TextEncoding};
use recon_model::Dataset;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode delimited payload: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to finalize delimited payload: {0}")]
    Flush(#[from] std::io::Error),

    #[error("failed to build container {path}: {message}")]
    Container { path: PathBuf, message: String },
}

type Result<T> = std::result::Result<T, ExportError>;

/// Fully resolved settings for one export step.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub directory: PathBuf,
    pub filename_prefix: String,
    pub format: ExportFormat,
    pub separator: char,
    pub encoding: TextEncoding,
    /// Appended to the filename when set (`<prefix>_<timestamp>`).
    pub timestamp: Option<String>,
}

/// Current local time formatted for artifact filenames.
pub fn run_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Write a dataset as a delimited artifact.
///
/// Prior files in the target directory whose names start with the
/// configured prefix are deleted first; the previous run keeps no artifacts
/// under this prefix.
pub fn export_dataset(dataset: &Dataset, settings: &ExportSettings) -> Result<PathBuf> {
    std::fs::create_dir_all(&settings.directory).map_err(|source| ExportError::Io {
        path: settings.directory.clone(),
        source,
    })?;
    remove_prior_artifacts(&settings.directory, &settings.filename_prefix)?;

    let stem = match &settings.timestamp {
        Some(timestamp) => format!("{}_{timestamp}", settings.filename_prefix),
        None => settings.filename_prefix.clone(),
    };

    let payload = encode_delimited(dataset, settings.separator, settings.encoding)?;
    let path = match settings.format {
        ExportFormat::Csv => {
            let path = settings.directory.join(format!("{stem}.csv"));
            std::fs::write(&path, &payload).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            path
        }
        ExportFormat::Zip => {
            let path = settings.directory.join(format!("{stem}.zip"));
            write_container(&path, &format!("{stem}.csv"), &payload)?;
            path
        }
    };
    debug!(
        path = %path.display(),
        records = dataset.len(),
        "artifact written"
    );
    Ok(path)
}

fn remove_prior_artifacts(directory: &Path, prefix: &str) -> Result<()> {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(source) => {
            return Err(ExportError::Io {
                path: directory.to_path_buf(),
                source,
            });
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name.starts_with(prefix) {
            debug!(path = %path.display(), "removing prior artifact");
            std::fs::remove_file(&path).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

fn encode_delimited(
    dataset: &Dataset,
    separator: char,
    encoding: TextEncoding,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(separator as u8)
        .from_writer(Vec::new());
    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        let cells: Vec<&str> = dataset
            .columns()
            .iter()
            .map(|column| row.get(column).unwrap_or(""))
            .collect();
        writer.write_record(&cells)?;
    }
    let text = writer
        .into_inner()
        .map_err(|error| ExportError::Flush(error.into_error()))?;

    match encoding {
        TextEncoding::Utf8Bom => {
            let mut payload = Vec::with_capacity(text.len() + 3);
            payload.extend_from_slice(b"\xEF\xBB\xBF");
            payload.extend_from_slice(&text);
            Ok(payload)
        }
        TextEncoding::Latin1 => {
            let decoded = String::from_utf8_lossy(&text);
            let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(&decoded);
            Ok(encoded.into_owned())
        }
    }
}

fn write_container(path: &Path, inner_name: &str, payload: &[u8]) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(inner_name, zip::write::SimpleFileOptions::default())
        .map_err(|error| ExportError::Container {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
    writer.write_all(payload).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    writer.finish().map_err(|error| ExportError::Container {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_model::Record;

    fn sample() -> Dataset {
        let mut dataset = Dataset::new(["CONTRATO", "VALOR"]);
        dataset.push_row(Record::from_pairs([("CONTRATO", "C1"), ("VALOR", "10")]));
        dataset.push_row(Record::from_pairs([("CONTRATO", "C2"), ("VALOR", "20")]));
        dataset
    }

    fn settings(dir: &Path, format: ExportFormat) -> ExportSettings {
        ExportSettings {
            directory: dir.to_path_buf(),
            filename_prefix: "acme_batimento".to_string(),
            format,
            separator: ';',
            encoding: TextEncoding::Utf8Bom,
            timestamp: None,
        }
    }

    #[test]
    fn csv_export_carries_bom_and_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_dataset(&sample(), &settings(dir.path(), ExportFormat::Csv)).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\xEF\xBB\xBF"));
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.starts_with("CONTRATO;VALOR"));
        assert!(text.contains("C1;10"));
    }

    #[test]
    fn prior_artifacts_with_same_prefix_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("acme_batimento_20200101_000000.csv");
        let unrelated = dir.path().join("outro_cliente.csv");
        std::fs::write(&stale, b"old").unwrap();
        std::fs::write(&unrelated, b"keep").unwrap();

        export_dataset(&sample(), &settings(dir.path(), ExportFormat::Csv)).unwrap();
        assert!(!stale.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn zip_export_wraps_single_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_dataset(&sample(), &settings(dir.path(), ExportFormat::Zip)).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("zip"));
        let file = std::fs::File::open(&path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 1);
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "acme_batimento.csv");
    }

    #[test]
    fn timestamp_suffix_applied() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path(), ExportFormat::Csv);
        settings.timestamp = Some("20240101_120000".to_string());
        let path = export_dataset(&sample(), &settings).unwrap();
        assert!(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap()
                .contains("20240101_120000")
        );
    }
}
