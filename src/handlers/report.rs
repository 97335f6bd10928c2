// src/handlers/report.rs
use log::{error, info};
use std::sync::Arc;
use warp::reply::{Html, Json};
use warp::Rejection;

use crate::config::Settings;
use crate::handlers::error::ApiError;
use crate::models::RankedReport;
use crate::services::report::{render_report, ReportOptions};

fn build(settings: &Settings) -> Result<RankedReport, Rejection> {
    settings.source.build_report().map_err(|e| {
        error!("Failed to build report data: {}", e);
        warp::reject::custom(ApiError::from(e))
    })
}

pub async fn get_report_page(settings: Arc<Settings>) -> Result<Html<String>, Rejection> {
    let report = build(&settings)?;
    match render_report(&report, &ReportOptions::default()) {
        Ok(html) => {
            info!("Rendered report page ({} bytes)", html.len());
            Ok(warp::reply::html(html))
        }
        Err(e) => {
            error!("Failed to render report: {}", e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}

pub async fn get_indices(settings: Arc<Settings>) -> Result<Json, Rejection> {
    let report = build(&settings)?;
    info!("Serving {} ranked indices", report.sorted.len());
    Ok(warp::reply::json(&report))
}
