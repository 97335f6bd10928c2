// src/services/data_store.rs
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, Result};
use crate::models::IndexRecord;
use crate::services::analytics::summarize;

pub const ALL_INDICES_FILE: &str = "all_indices.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// File name used for a single index document (`^GSPC` -> `GSPC.json`).
pub fn index_file_name(symbol: &str) -> String {
    format!("{}.json", symbol.replace('^', ""))
}

/// Reads the pre-built `all_indices.json` document.
pub fn load_indices(data_dir: &Path) -> Result<Vec<IndexRecord>> {
    let path = data_dir.join(ALL_INDICES_FILE);
    info!("Loading index data from {}", path.display());

    let raw = fs::read_to_string(&path).map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        ReportError::DataUnavailable(format!("cannot read {}: {}", path.display(), e))
    })?;

    let records: Vec<IndexRecord> = serde_json::from_str(&raw).map_err(|e| {
        error!("Failed to parse {}: {}", path.display(), e);
        ReportError::DataUnavailable(format!("malformed {}: {}", path.display(), e))
    })?;

    if records.is_empty() {
        return Err(ReportError::DataUnavailable(format!(
            "{} contains no indices",
            path.display()
        )));
    }

    info!("Loaded {} indices", records.len());
    Ok(records)
}

/// Writes one document per index, `all_indices.json` and the sorted `summary.json`.
/// Returns the paths written.
pub fn save_indices(data_dir: &Path, records: &[IndexRecord]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(data_dir)?;
    let mut written = Vec::with_capacity(records.len() + 2);

    for record in records {
        let path = data_dir.join(index_file_name(&record.descriptor.symbol));
        fs::write(&path, serde_json::to_string_pretty(record)?)?;
        written.push(path);
    }

    let all_path = data_dir.join(ALL_INDICES_FILE);
    fs::write(&all_path, serde_json::to_string_pretty(records)?)?;
    written.push(all_path);

    let summary_path = data_dir.join(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&summarize(records))?)?;
    written.push(summary_path);

    info!("Saved {} files to {}", written.len(), data_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IndexDescriptor, IndexSummary, MonthlyObservation, YearMonth};
    use crate::services::analytics::compute_metrics;

    fn record(symbol: &str, end: f64) -> IndexRecord {
        let data = vec![
            MonthlyObservation { date: YearMonth::new(2020, 1).unwrap(), value: 100.0 },
            MonthlyObservation { date: YearMonth::new(2020, 2).unwrap(), value: end },
        ];
        compute_metrics(IndexRecord::new(IndexDescriptor::new(symbol, symbol, "X"), data)).unwrap()
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("^GSPC", 90.0), record("^N225", 130.0)];

        let written = save_indices(dir.path(), &records).unwrap();
        assert_eq!(written.len(), 4);
        assert!(dir.path().join("GSPC.json").exists());

        let loaded = load_indices(dir.path()).unwrap();
        assert_eq!(loaded, records);

        let summary: Vec<IndexSummary> =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary[0].descriptor.symbol, "^N225");
    }

    #[test]
    fn missing_document_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_indices(dir.path()), Err(ReportError::DataUnavailable(_))));
    }

    #[test]
    fn empty_or_malformed_document_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(ALL_INDICES_FILE), "[]").unwrap();
        assert!(matches!(load_indices(dir.path()), Err(ReportError::DataUnavailable(_))));

        fs::write(dir.path().join(ALL_INDICES_FILE), "{not json").unwrap();
        assert!(matches!(load_indices(dir.path()), Err(ReportError::DataUnavailable(_))));
    }
}
