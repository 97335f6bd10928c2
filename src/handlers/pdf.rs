// src/handlers/pdf.rs
use log::{error, info};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Reply;

use crate::config::Settings;
use crate::error::ReportError;
use crate::services::pdf::generate_pdf;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Relays one PDF request to the external generator.
///
/// Every outcome is a JSON body, so this never rejects.
pub async fn post_generate_pdf(settings: Arc<Settings>) -> Result<impl Reply, Infallible> {
    let (status, body) = match generate_pdf(&settings.pdf).await {
        Ok(outcome) => {
            info!("PDF generated: {}", outcome.pdf_url);
            (
                StatusCode::OK,
                PdfResponse {
                    success: true,
                    message: "PDF generated successfully".to_string(),
                    pdf_url: Some(outcome.pdf_url),
                    error: None,
                },
            )
        }
        Err(e) => {
            error!("Error generating PDF: {}", e);
            let detail = match e {
                ReportError::ExternalProcessFailure { stderr, .. } => stderr,
                other => other.to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                PdfResponse {
                    success: false,
                    message: "Error generating PDF".to_string(),
                    pdf_url: None,
                    error: Some(detail),
                },
            )
        }
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
