//! JSON output formatter

use anyhow::Result;
use newsdesk_core::{ArticleSummaryView, SmartQueryResponse};

pub fn format_articles(articles: &[ArticleSummaryView]) -> Result<String> {
    Ok(serde_json::to_string_pretty(articles)? + "\n")
}

pub fn format_response(response: &SmartQueryResponse) -> Result<String> {
    Ok(serde_json::to_string_pretty(response)? + "\n")
}
