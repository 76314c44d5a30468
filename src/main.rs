//! CLI entry point for the taxi trip ETL tool.
//!
//! Ingests new trip files from the input directory into SQLite and reports
//! the rolling average trip duration over the trailing window.

use std::ffi::OsStr;
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use taxi_trip_etl::{output, pipeline, store::TripStore};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "taxi_trip_etl")]
#[command(about = "Ingests yellow taxi trip files and reports a rolling average trip time", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(short, long, default_value = "yellow_taxi_trip.db")]
    database: String,

    /// Directory containing trip files to ingest
    #[arg(short, long, default_value = "Data")]
    input_dir: String,

    /// Rolling average window in days
    #[arg(short = 'w', long, default_value_t = 45)]
    window_days: u32,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/taxi_trip_etl.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxi_trip_etl.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let store = TripStore::new(&cli.database);
    let today = Utc::now().date_naive();

    let summary = pipeline::run(&store, Path::new(&cli.input_dir), cli.window_days, today)?;
    output::log_summary(&summary)?;

    println!("{}", summary.report_line());

    Ok(())
}
