use anyhow::{anyhow, bail};
use chrono::{Months, Utc};
use clap::Parser;
use dotenv::dotenv;
use global_indices_report::services::analytics::{rank_and_select, summarize};
use global_indices_report::services::data_store::save_indices;
use global_indices_report::services::yahoo::{yahoo_indices, YahooClient};
use log::{error, info};
use std::path::PathBuf;

/// Download ten years of monthly index closes from Yahoo Finance.
#[derive(Parser, Debug)]
#[command(name = "fetch_indices", version, about)]
struct Args {
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Length of the history window in years
    #[arg(long, default_value_t = 10)]
    years: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let end = Utc::now().date_naive();
    let start = end
        .checked_sub_months(Months::new(args.years * 12))
        .ok_or_else(|| anyhow!("history window starts before the supported date range"))?;

    info!("Fetching indices from {} to {}", start, end);
    let client = YahooClient::new()?;
    let records = client.fetch_indices(&yahoo_indices(), start, end).await;

    if records.is_empty() {
        error!("No index data could be fetched");
        bail!("no index data fetched");
    }

    save_indices(&args.data_dir, &records)?;

    for row in summarize(&records) {
        println!(
            "{:<30} {:>9.2}% {:>8.2}% {:>8.2}%",
            row.descriptor.name,
            row.total_return * 100.0,
            row.annualized_return * 100.0,
            row.volatility * 100.0
        );
    }

    let ranked = rank_and_select(&records)?;
    println!("Indices fetched: {}", records.len());
    if let Some((first, last)) = records[0].date_range() {
        println!("Date range: {} to {}", first, last);
    }
    if let (Some(best), Some(worst)) = (ranked.best_performers.first(), ranked.worst_performers.first()) {
        println!("Best performer: {} ({:.2}%)", best.name(), best.total_return * 100.0);
        println!("Worst performer: {} ({:.2}%)", worst.name(), worst.total_return * 100.0);
    }
    Ok(())
}
