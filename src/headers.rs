//! Column header extraction from uploaded CSV files

use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// List `.csv` files directly under `dir`, sorted by file name
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_csv = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read the header row of the first CSV file in `dir`.
///
/// Returns `Ok(None)` (and logs a warning) when the directory holds no CSV.
/// Only the first file is inspected; other CSVs are not merged or checked.
pub fn extract_headers(dir: &Path) -> Result<Option<Vec<String>>> {
    let files = list_csv_files(dir)?;
    let Some(first) = files.first() else {
        warn!("No CSV files found in {}", dir.display());
        return Ok(None);
    };

    debug!("Reading headers from {}", first.display());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(first)?;

    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Ok(Some(Vec::new()));
    }

    let headers = record
        .iter()
        .map(|col| col.trim_start_matches('\u{feff}').trim())
        .filter(|col| !col.is_empty())
        .map(str::to_string)
        .collect();

    Ok(Some(headers))
}

/// Render headers the way the classifier prompt expects them: `[a, b, c]`
pub fn format_header_list(headers: &[String]) -> String {
    format!("[{}]", headers.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_header_with_comma_stays_one_column() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("data.csv"),
            "id,\"price, usd\",label\n1,2,3\n",
        )
        .unwrap();

        let headers = extract_headers(dir.path()).unwrap().unwrap();
        assert_eq!(headers, vec!["id", "price, usd", "label"]);
    }

    #[test]
    fn byte_order_mark_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("data.csv"), "\u{feff}band1,band2\n").unwrap();

        let headers = extract_headers(dir.path()).unwrap().unwrap();
        assert_eq!(headers, vec!["band1", "band2"]);
    }

    #[test]
    fn empty_file_yields_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("empty.csv"), "").unwrap();

        assert_eq!(extract_headers(dir.path()).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn header_list_formatting() {
        let headers = vec!["pixel_id".to_string(), "band1".to_string()];
        assert_eq!(format_header_list(&headers), "[pixel_id, band1]");
        assert_eq!(format_header_list(&[]), "[]");
    }
}
