// src/config.rs
use dotenv::dotenv;
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use crate::error::{ReportError, Result};
use crate::services::pdf::PdfConfig;
use crate::services::source::DataSource;

pub const DEFAULT_PORT: u16 = 3000;

/// Server and report settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub source: DataSource,
    pub static_dir: PathBuf,
    pub pdf: PdfConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: DEFAULT_PORT,
            source: DataSource::Mock { seed: None },
            static_dir: PathBuf::from("."),
            pdf: PdfConfig::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ReportError::Config(format!("PORT must be a number, got {:?}", raw)))?,
            None => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let seed = match lookup("REPORT_SEED") {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                ReportError::Config(format!("REPORT_SEED must be an unsigned integer, got {:?}", raw))
            })?),
            None => None,
        };

        let data_dir = lookup("REPORT_DATA_DIR").unwrap_or_else(|| "data".to_string());
        let source = match lookup("REPORT_DATA_MODE").as_deref().map(str::trim) {
            None | Some("mock") => DataSource::Mock { seed },
            Some("file") => DataSource::File { data_dir: PathBuf::from(data_dir) },
            Some(other) => {
                return Err(ReportError::Config(format!(
                    "REPORT_DATA_MODE must be 'mock' or 'file', got {:?}",
                    other
                )))
            }
        };

        let mut pdf = defaults.pdf;
        if let Some(program) = lookup("PDF_COMMAND") {
            pdf.program = program;
        }
        if let Some(script) = lookup("PDF_SCRIPT") {
            pdf.args = script.split_whitespace().map(str::to_string).collect();
        }
        if let Some(name) = lookup("PDF_OUTPUT_NAME") {
            pdf.output_name = name;
        }

        let static_dir = lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir);

        let settings = Settings { port, source, static_dir, pdf };
        info!("Loaded settings: {:?}", settings);
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.port, 3000);
        assert_eq!(s.source, DataSource::Mock { seed: None });
        assert_eq!(s.pdf.program, "python");
        assert_eq!(s.pdf.args, vec!["python/pdf_generator.py"]);
        assert_eq!(s.pdf.output_name, "Stock_Market_Indices_Report.pdf");
    }

    #[test]
    fn file_mode_uses_data_dir() {
        let s = settings(&[("REPORT_DATA_MODE", "file"), ("REPORT_DATA_DIR", "/tmp/indices")]).unwrap();
        assert_eq!(s.source, DataSource::File { data_dir: PathBuf::from("/tmp/indices") });
    }

    #[test]
    fn seed_and_pdf_overrides() {
        let s = settings(&[
            ("PORT", "8080"),
            ("REPORT_SEED", "42"),
            ("PDF_COMMAND", "python3"),
            ("PDF_SCRIPT", "tools/pdf.py --fast"),
        ])
        .unwrap();
        assert_eq!(s.port, 8080);
        assert_eq!(s.source, DataSource::Mock { seed: Some(42) });
        assert_eq!(s.pdf.program, "python3");
        assert_eq!(s.pdf.args, vec!["tools/pdf.py", "--fast"]);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(settings(&[("PORT", "http")]), Err(ReportError::Config(_))));
        assert!(matches!(settings(&[("REPORT_SEED", "-1")]), Err(ReportError::Config(_))));
        assert!(matches!(settings(&[("REPORT_DATA_MODE", "live")]), Err(ReportError::Config(_))));
    }
}
