// src/services/pdf.rs
use log::{error, info};
use tokio::process::Command;

use crate::error::{ReportError, Result};

/// How to invoke the external PDF generator.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub program: String,
    pub args: Vec<String>,
    /// File name handed back to the client once the generator succeeds.
    pub output_name: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        PdfConfig {
            program: "python".to_string(),
            args: vec!["python/pdf_generator.py".to_string()],
            output_name: "Stock_Market_Indices_Report.pdf".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOutcome {
    pub pdf_url: String,
}

/// Runs the generator once and waits for it to exit.
///
/// Exit code 0 is success; anything else, a signal, or a spawn failure is an
/// `ExternalProcessFailure` carrying the captured standard error.
pub async fn generate_pdf(config: &PdfConfig) -> Result<PdfOutcome> {
    info!("Spawning PDF generator: {} {:?}", config.program, config.args);

    let output = Command::new(&config.program)
        .args(&config.args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            error!("Failed to spawn {}: {}", config.program, e);
            ReportError::ExternalProcessFailure {
                code: None,
                stderr: format!("failed to start {}: {}", config.program, e),
            }
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    for line in stdout.lines() {
        info!("PDF generator stdout: {}", line);
    }
    for line in stderr.lines() {
        error!("PDF generator stderr: {}", line);
    }

    let code = output.status.code();
    info!("PDF generator exited with code {:?}", code);

    if output.status.success() {
        Ok(PdfOutcome {
            pdf_url: config.output_name.clone(),
        })
    } else {
        Err(ReportError::ExternalProcessFailure { code, stderr })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn shell(script: &str) -> PdfConfig {
        PdfConfig {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
            ..PdfConfig::default()
        }
    }

    #[tokio::test]
    async fn zero_exit_returns_file_name() {
        let outcome = generate_pdf(&shell("echo done")).await.unwrap();
        assert_eq!(
            outcome,
            PdfOutcome {
                pdf_url: "Stock_Market_Indices_Report.pdf".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let err = generate_pdf(&shell("echo 'no data files' >&2; exit 3")).await.unwrap_err();
        match err {
            ReportError::ExternalProcessFailure { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("no data files"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_process_failure() {
        let config = PdfConfig {
            program: "definitely-not-a-real-pdf-generator".to_string(),
            args: vec![],
            ..PdfConfig::default()
        };
        assert!(matches!(
            generate_pdf(&config).await,
            Err(ReportError::ExternalProcessFailure { code: None, .. })
        ));
    }
}
