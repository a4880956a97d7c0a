//! NewsDesk CLI
//!
//! Ingest news data and query it by intent, category, source, score or location.

use anyhow::Result;
use clap::Parser;
use newsdesk_core::{Config, Database, NewsDeskError};

mod app;
mod commands;
mod output;

use app::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // NEWSDESK_DB overrides the cache location unless the config names a path
    let db = Database::open(config.database_path())?;
    db.initialize()?;

    let result = match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, &db, cli.format).await,
        Commands::Status => commands::status::run(&db, cli.format).await,
        Commands::Ask(args) => commands::ask::run(args, &db, &config, cli.format).await,
        Commands::Category(args) => {
            commands::retrieve::run_category(args, &db, &config.query, cli.format).await
        }
        Commands::Search(args) => {
            commands::retrieve::run_search(args, &db, &config.query, cli.format).await
        }
        Commands::Source(args) => {
            commands::retrieve::run_source(args, &db, &config.query, cli.format).await
        }
        Commands::Score(args) => {
            commands::retrieve::run_score(args, &db, &config.query, cli.format).await
        }
        Commands::Nearby(args) => {
            commands::retrieve::run_nearby(args, &db, &config.query, cli.format).await
        }
        Commands::Mcp => newsdesk_mcp::start_server(&db, &config).await,
    };

    if let Err(e) = result {
        if let Some(err) = e.downcast_ref::<NewsDeskError>() {
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
        return Err(e);
    }
    Ok(())
}
