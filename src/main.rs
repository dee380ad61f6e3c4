//! Pagewise CLI entry point.

use anyhow::Result;
use clap::Parser;
use pagewise::cli::{commands, preflight, Cli, Commands};
use pagewise::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("pagewise={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Ask { file, question } => {
            commands::run_ask(file, question, cli.api_key.as_deref(), settings).await?;
        }

        Commands::Chat { file } => {
            commands::run_chat(file, cli.api_key.as_deref(), settings).await?;
        }

        Commands::Serve { host, port } => {
            // Credentials are optional here; clients can post them later.
            let api_key = preflight::resolve_api_key(cli.api_key.as_deref(), &settings).ok();
            commands::run_serve(host, *port, api_key, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
