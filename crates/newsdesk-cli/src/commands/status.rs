//! Status command

use crate::app::OutputFormat;
use anyhow::Result;
use newsdesk_core::Database;

pub async fn run(db: &Database, format: OutputFormat) -> Result<()> {
    let stats = db.get_stats()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Cli => {
            println!("Articles:        {}", stats.article_count);
            println!("Sources:         {}", stats.source_count);
            println!("Summarized:      {}", stats.summarized_count);
            if let (Some(earliest), Some(latest)) =
                (&stats.earliest_publication, &stats.latest_publication)
            {
                println!();
                println!("Published:");
                println!("  Earliest:      {}", earliest);
                println!("  Latest:        {}", latest);
            }
            if !stats.categories.is_empty() {
                println!();
                println!("Categories:");
                for (category, count) in &stats.categories {
                    println!("  {:<14} {}", format!("{}:", category), count);
                }
            }
        }
    }
    Ok(())
}
