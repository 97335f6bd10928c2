// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::config::Settings;
use crate::handlers::error::ApiError;
use crate::handlers::pdf::post_generate_pdf;
use crate::handlers::report::{get_indices, get_report_page};

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message: &str;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found";
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = &api_error.message;
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed";
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error";
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(settings: Arc<Settings>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let static_dir = settings.static_dir.clone();
    let settings_filter = warp::any().map(move || settings.clone());

    let report_route = warp::path::end()
        .and(warp::get())
        .and(settings_filter.clone())
        .and_then(get_report_page);

    let indices_route = warp::path!("api" / "v1" / "indices")
        .and(warp::get())
        .and(settings_filter.clone())
        .and_then(get_indices);

    let pdf_route = warp::path!("generate-pdf")
        .and(warp::post())
        .and(settings_filter.clone())
        .and_then(post_generate_pdf);

    let static_route = warp::fs::dir(static_dir);

    info!("All routes configured successfully.");

    report_route
        .or(indices_route)
        .or(pdf_route)
        .or(static_route)
        .recover(handle_rejection)
}
