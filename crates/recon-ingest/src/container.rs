//! Container handling: payloads arrive either as plain delimited text or
//! wrapped in a single-file zip container, detected by extension.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{IngestError, Result};

fn is_zip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Read the raw payload bytes behind `path`. For `.zip` paths this is the
/// first file entry inside the archive; anything else is the file itself.
pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if is_zip(path) {
        read_zip_payload(path)
    } else {
        std::fs::read(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_zip_payload(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|source| IngestError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(file).map_err(|error| IngestError::Container {
        path: path.to_path_buf(),
        message: error.to_string(),
    })?;
    // Skip directory entries; take the first real file.
    let entry_index = (0..archive.len())
        .find(|&index| {
            archive
                .by_index(index)
                .map(|entry| entry.is_file())
                .unwrap_or(false)
        })
        .ok_or_else(|| IngestError::EmptyContainer {
            path: path.to_path_buf(),
        })?;
    let mut entry = archive
        .by_index(entry_index)
        .map_err(|error| IngestError::Container {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
    let mut payload = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut payload)
        .map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn plain_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"A;B\n1;2\n").unwrap();
        assert_eq!(read_payload(&path).unwrap(), b"A;B\n1;2\n");
    }

    #[test]
    fn zip_container_yields_first_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.zip");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("inner.csv", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"A;B\n1;2\n").unwrap();
        writer.finish().unwrap();

        assert_eq!(read_payload(&path).unwrap(), b"A;B\n1;2\n");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let error = read_payload(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(error, IngestError::FileNotFound { .. }));
    }
}
