use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use global_indices_report::services::data_store::save_indices;
use global_indices_report::services::report::{render_report, ReportOptions};
use global_indices_report::services::source::DataSource;
use log::{error, info};
use std::path::PathBuf;

/// Build the static HTML indices report.
#[derive(Parser, Debug)]
#[command(name = "generate_report", version, about)]
struct Args {
    /// Read `all_indices.json` from this directory instead of synthesizing data
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Seed for synthesized data
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the HTML page
    #[arg(short, long, default_value = "index.html")]
    output: PathBuf,

    /// Also write the analyzed series as JSON documents to this directory
    #[arg(long)]
    save_data: Option<PathBuf>,

    #[arg(long)]
    title: Option<String>,
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let source = match args.data_dir {
        Some(data_dir) => DataSource::File { data_dir },
        None => DataSource::Mock { seed: args.seed },
    };

    let report = source.build_report().map_err(|e| {
        error!("Failed to build report data: {}", e);
        e
    })?;

    if let Some(dir) = &args.save_data {
        save_indices(dir, &report.sorted)?;
    }

    let mut options = ReportOptions::default().with_output(&args.output);
    if let Some(title) = args.title {
        options = options.with_title(title);
    }
    render_report(&report, &options)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!("Report written to {}", args.output.display());
    for record in &report.best_performers {
        info!("Best: {} ({:.2}%)", record.name(), record.total_return * 100.0);
    }
    for record in &report.worst_performers {
        info!("Worst: {} ({:.2}%)", record.name(), record.total_return * 100.0);
    }
    Ok(())
}
