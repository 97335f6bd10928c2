// src/error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Degenerate time series handed to the analytics layer.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    #[error("external process failed (exit code {code:?}): {stderr}")]
    ExternalProcessFailure { code: Option<i32>, stderr: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
