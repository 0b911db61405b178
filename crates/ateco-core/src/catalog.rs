//! Catalog loading from CSV.
//!
//! One row per catalog entry. Column names vary slightly between catalog
//! versions (`descriptor` vs `description`); both are accepted. A malformed
//! row is skipped with a warning and never aborts the load.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::CatalogEntry;

const REQUIRED_COLUMNS: [&str; 4] = ["code", "title", "hierarchy", "activity"];

/// Load catalog entries from `path`.
///
/// Fails only on an unreadable file or a missing required column; row-level
/// anomalies are isolated per entry.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| Error::NotFound(format!("catalog {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| Error::CatalogFormat(format!("unreadable header row: {e}")))?
        .clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(Error::CatalogFormat(format!("missing required column '{col}'")));
        }
    }
    if !headers.iter().any(|h| h == "descriptor" || h == "description") {
        return Err(Error::CatalogFormat(
            "missing required column 'descriptor' (or 'description')".to_string(),
        ));
    }

    let mut entries = Vec::new();
    for (row, record) in reader.deserialize::<CatalogEntry>().enumerate() {
        match record {
            Ok(mut entry) => {
                entry.descriptor = entry.descriptor.filter(|s| !s.trim().is_empty());
                entry.activity = entry.activity.filter(|s| !s.trim().is_empty());
                entries.push(entry);
            }
            Err(e) => {
                tracing::warn!(row = row + 2, error = %e, "skipping malformed catalog row");
            }
        }
    }
    tracing::debug!(path = %path.display(), entries = entries.len(), "catalog loaded");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("temp file");
        f.write_all(content.as_bytes()).expect("write");
        f
    }

    #[test]
    fn loads_rows_and_maps_empty_cells_to_none() {
        let f = write_csv(
            "code,title,descriptor,hierarchy,activity\n\
             01.11,Cereal farming,Growing of cereals.,A > Crops,farming\n\
             01.12,Rice growing,,A > Crops,\n",
        );
        let entries = load_catalog(f.path()).expect("load");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].code, "01.11");
        assert_eq!(entries[0].descriptor.as_deref(), Some("Growing of cereals."));
        assert!(entries[1].descriptor.is_none());
        assert!(entries[1].activity.is_none());
    }

    #[test]
    fn accepts_description_column_alias() {
        let f = write_csv(
            "code,title,description,hierarchy,activity\n\
             01.11,Cereal farming,Growing of cereals.,A > Crops,farming\n",
        );
        let entries = load_catalog(f.path()).expect("load");
        assert_eq!(entries[0].descriptor.as_deref(), Some("Growing of cereals."));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let f = write_csv("code,title,descriptor,hierarchy\n01.11,x,y,z\n");
        let err = load_catalog(f.path()).unwrap_err();
        assert!(matches!(err, Error::CatalogFormat(_)));
    }

    #[test]
    fn malformed_row_is_skipped_not_fatal() {
        let f = write_csv(
            "code,title,descriptor,hierarchy,activity\n\
             01.11,Cereal farming,Growing of cereals.,A > Crops,farming\n\
             \"unterminated,oops\n\
             01.12,Rice growing,Rice.,A > Crops,farming\n",
        );
        let entries = load_catalog(f.path()).expect("load");
        assert!(entries.iter().any(|e| e.code == "01.11"));
    }
}
