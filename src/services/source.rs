// src/services/source.rs
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{IndexRecord, RankedReport};
use crate::services::analytics::analyze;
use crate::services::data_store::load_indices;
use crate::services::indices::{default_indices, SynthesisWindow};
use crate::services::synthesizer::generate_mock_data;

/// Where a report build gets its index series from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// Synthesized series; a fixed seed makes the values reproducible.
    Mock { seed: Option<u64> },
    /// `all_indices.json` in the given directory.
    File { data_dir: PathBuf },
}

impl DataSource {
    pub fn load_records(&self) -> Result<Vec<IndexRecord>> {
        match self {
            DataSource::Mock { seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                generate_mock_data(&default_indices(), SynthesisWindow::default(), &mut rng)
            }
            DataSource::File { data_dir } => load_indices(data_dir),
        }
    }

    /// One full build: load, compute metrics, rank.
    pub fn build_report(&self) -> Result<RankedReport> {
        info!("Building report from {:?}", self);
        analyze(self.load_records()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    #[test]
    fn seeded_mock_builds_are_repeatable() {
        let source = DataSource::Mock { seed: Some(2013) };
        let a = source.build_report().unwrap();
        let b = source.build_report().unwrap();
        assert_eq!(a.sorted, b.sorted);
        assert_eq!(a.sorted.len(), 10);
        assert_eq!(a.best_performers.len(), 2);
        assert_eq!(a.worst_performers.len(), 2);
        assert!(a.best_performers[0].total_return >= a.worst_performers[0].total_return);
    }

    #[test]
    fn missing_file_source_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = DataSource::File { data_dir: dir.path().to_path_buf() };
        assert!(matches!(source.build_report(), Err(ReportError::DataUnavailable(_))));
    }
}
