//! MultiAI - one prompt, several AI chat sites
//!
//! Main entry point for the MultiAI CLI.

mod adapters;
mod cli;
mod cmd_dialog;
mod cmd_history;

use clap::Parser;
use tracing::error;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use multiai_config::multiai_dir;

use cli::{Cli, Commands};
use cmd_dialog::Loaded;
use cmd_history::handle_history_command;

fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = multiai_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("multiai")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Keeps the background writer alive until exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        // Console layer on stderr, stdout carries command output.
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing()?;

    let cli = Cli::parse();
    let loaded = Loaded::load(&cli.config, cli.settings.as_deref())?;

    let result = match cli.command {
        Commands::Open => cmd_dialog::open(&loaded).await,
        Commands::Send {
            text,
            note,
            lines,
            collect,
        } => {
            cmd_dialog::send(&loaded, text, note.as_deref(), lines.as_deref(), collect).await
        }
        Commands::Collect => cmd_dialog::collect(&loaded).await,
        Commands::TestSelector { frame, kind } => {
            cmd_dialog::test_selector(&loaded, frame, kind).await
        }
        Commands::Close => cmd_dialog::close(&loaded).await,
        Commands::Platforms => cmd_dialog::platforms(&loaded),
        Commands::History { action } => handle_history_command(action, &loaded).await,
        Commands::Validate => cmd_dialog::validate(&loaded),
    };

    if let Err(e) = &result {
        error!("Command failed: {}", e);
    }
    result
}
