use dotenv::dotenv;
use global_indices_report::config::Settings;
use global_indices_report::routes;
use log::{error, info};
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use warp::Filter;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(Arc::new(settings)).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Server running on port {}", addr.port());
    warp::serve(api).run(addr).await;
}
