use std::sync::Arc;

use clap::Parser;
use error::AppError;
use hlsmerge_engine::hls::ProgressSink;
use indicatif::MultiProgress;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;

mod cli;
mod error;
mod processor;
mod utils;

use cli::CliArgs;
use utils::progress::ProgressManager;

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    // Setup logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("hlsmerge.log")?;

    let multi_writer = MakeWriterExt::and(std::io::stdout, log_file);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(multi_writer)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    info!("HLS segment downloader and merger - Part of the rust-srec project by hua0512");
    info!(
        threads = args.threads,
        retries = args.retries,
        timeout_s = args.timeout,
        "Configuration"
    );

    let multi = MultiProgress::new();
    let progress: Arc<dyn ProgressSink> = if args.no_progress {
        Arc::new(ProgressManager::new_disabled(multi))
    } else {
        Arc::new(ProgressManager::new(multi))
    };

    processor::process(&args, progress).await?;
    Ok(())
}
