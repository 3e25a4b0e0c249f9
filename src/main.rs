//! Kontekst CLI entry point.

use anyhow::Result;
use clap::Parser;
use kontekst::cli::{commands, Cli, Commands};
use kontekst::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("kontekst={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure data directory exists
    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match &cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Ingest { file, doc_id, force } => {
            commands::run_ingest(file, doc_id, *force, settings).await?;
        }

        Commands::Search { query, limit, doc } => {
            commands::run_search(query, *limit, doc.as_deref(), settings).await?;
        }

        Commands::Context {
            transcript,
            doc,
            top_k,
            all,
            json,
        } => {
            commands::run_context(transcript, doc.as_deref(), *top_k, *all, *json, settings)
                .await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Delete { doc_id } => {
            commands::run_delete(doc_id, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
