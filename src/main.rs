//! Aether - durable single-node task queue.
//!
//! Main entry point for the Aether CLI and service.

mod cli;
mod cmd_run;
mod cmd_task;

use std::path::Path;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use aether_config::ConfigLoader;

use crate::cli::{Cli, Commands};

/// Console plus daily-rolling file output under `log_dir`.
fn init_tracing(log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("aether")
        .filename_suffix("log")
        .max_log_files(14)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the whole process.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    init_tracing(&config.logs_dir())?;

    let command = cli.command.unwrap_or(Commands::Run {
        workers: None,
        host: None,
        port: None,
        no_api: false,
    });

    match command {
        Commands::Run {
            workers,
            host,
            port,
            no_api,
        } => {
            if let Some(workers) = workers {
                config.runner.workers = workers;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if no_api {
                config.server.enabled = false;
            }
            cmd_run::run(config).await
        }
        Commands::Enqueue {
            task_type,
            payload,
            priority,
            max_attempts,
            timeout,
        } => {
            cmd_task::enqueue(config, task_type, &payload, priority, max_attempts, timeout).await
        }
        Commands::Task { action } => cmd_task::task(config, action).await,
        Commands::Command { text } => cmd_task::command(config, &text.join(" ")).await,
        Commands::Check => cmd_run::check(&config),
    }
}
