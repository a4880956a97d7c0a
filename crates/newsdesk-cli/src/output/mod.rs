//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use anyhow::Result;
use newsdesk_core::{ArticleSummaryView, SmartQueryResponse};

/// Format a plain article listing
pub fn format_articles(articles: &[ArticleSummaryView], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format_articles(articles),
        OutputFormat::Cli => Ok(terminal::format_articles(articles)),
    }
}

/// Format a smart query response
pub fn format_smart_response(response: &SmartQueryResponse, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format_response(response),
        OutputFormat::Cli => Ok(terminal::format_response(response)),
    }
}
