//! LuLu CLI - command-line client for the LuLu farm website.
//!
//! Browses the public site content, submits bookings and reviews, and runs
//! admin panel tasks against the farm's backend API.

mod cli;
mod commands;
mod output;

use std::io;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lulu_core::{ClientConfig, Config, SessionContext, TokenStore};

use cli::Cli;

/// Directory for daily log files; stderr only when unset
const LOG_DIR_ENV: &str = "LULU_LOG_DIR";

/// Initialize the tracing subscriber for logging.
///
/// Use `RUST_LOG` to control the level (e.g. `RUST_LOG=lulu_core=debug`).
/// The returned guard must be held until exit so buffered file logs flush.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);

    match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "lulu.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();
    let cli = Cli::parse();
    info!("LuLu CLI starting");

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });

    let client_config = match cli.backend_url.as_deref() {
        Some(url) => ClientConfig::new(url)?
            .with_timeout(Duration::from_secs(config.request_timeout_secs.max(1))),
        None => config.client_config()?,
    };
    let tokens = TokenStore::from_config(&config)?;
    let session = SessionContext::new(&client_config, tokens)?;

    commands::run(cli.command, &session, &mut config, cli.json).await
}
