//! Ingest command

use crate::app::{IngestArgs, OutputFormat};
use anyhow::Result;
use newsdesk_core::{ingest_path, Database};

pub async fn run(args: IngestArgs, db: &Database, format: OutputFormat) -> Result<()> {
    let db = db.clone();
    let report = tokio::task::spawn_blocking(move || ingest_path(&db, &args.path, args.clear))
        .await??;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Cli => {
            if report.cleared > 0 {
                println!("Cleared {} existing articles", report.cleared);
            }
            println!(
                "Ingested {} of {} articles from {} file(s)",
                report.inserted, report.total, report.files
            );
            if report.errors > 0 {
                println!("Skipped {} invalid or failed records", report.errors);
            }
        }
    }
    Ok(())
}
