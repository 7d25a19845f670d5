//! booktrack - a command-line client for the book tracker service.
//!
//! Logs in once, keeps the session token between runs, and manages the
//! user's reading list.

mod commands;

use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use booktrack_core::{ApiError, Config};

use commands::Cli;

/// Log file name prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "booktrack.log";

/// Initialize the tracing subscriber for logging.
///
/// Stderr always gets output filtered by `RUST_LOG` (default `warn`). When a
/// log directory is given, a daily-rolling file receives the same events.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ApiError>() {
                Some(api) => eprintln!("Error: {}", api.user_message()),
                None => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let log_dir = if cli.log_file {
        let dir = Config::cache_dir()?;
        std::fs::create_dir_all(&dir)?;
        Some(dir)
    } else {
        None
    };
    let _guard = init_tracing(log_dir.as_deref());
    info!("booktrack starting");

    let mut config = Config::load().inspect_err(|e| error!("Failed to load config: {:#}", e))?;

    commands::run(cli.command, &mut config).await
}
