//! Per-article summary generation

use super::LLMClient;
use crate::db::ArticleSummaryView;
use crate::error::{NewsDeskError, Result};
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

lazy_static! {
    static ref CODE_FENCE_RE: Regex = Regex::new(r"(?s)^```[^\n]*\n(.*?)\n?```$").unwrap();
}

const SUMMARY_SYSTEM_PROMPT: &str = "You are a news article summarizer. Create concise, informative summaries.

Guidelines:
- Summarize in 2-3 sentences
- Focus on key facts and developments
- Highlight impact and significance
- Mention main stakeholders
- Use clear, engaging language
- Keep it under 150 words

Return only the summary text, no additional formatting.";

/// Trim a completion and strip a surrounding markdown code fence
pub fn clean_summary(response: &str) -> String {
    let trimmed = response.trim();
    match CODE_FENCE_RE.captures(trimmed) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default(),
        None => trimmed.to_string(),
    }
}

/// Attaches generated summaries to retrieved articles
pub struct SummaryEnricher {
    client: Option<Arc<dyn LLMClient>>,
    timeout: Duration,
}

impl SummaryEnricher {
    pub fn new(client: Option<Arc<dyn LLMClient>>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Enricher that leaves articles untouched
    pub fn disabled() -> Self {
        Self {
            client: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Summarize one article's title and description
    pub async fn summarize(&self, title: &str, description: &str) -> Result<String> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| NewsDeskError::Llm("No LLM client configured".to_string()))?;

        let user_prompt = format!("Title: {}\nDescription: {}", title, description);
        let response = tokio::time::timeout(
            self.timeout,
            client.complete(SUMMARY_SYSTEM_PROMPT, &user_prompt),
        )
        .await
        .map_err(|_| NewsDeskError::Timeout(format!("summary for '{}'", title)))??;

        let summary = clean_summary(&response);
        if summary.is_empty() {
            return Err(NewsDeskError::Llm("Empty summary".to_string()));
        }
        Ok(summary)
    }

    /// Summarize every article concurrently
    ///
    /// Output has the same length and order as the input. An article whose
    /// summary fails is returned as it came in.
    pub async fn enrich(&self, articles: Vec<ArticleSummaryView>) -> Vec<ArticleSummaryView> {
        if !self.is_enabled() {
            return articles;
        }

        let tasks = articles.into_iter().map(|mut view| async move {
            match self
                .summarize(&view.article.title, &view.article.description)
                .await
            {
                Ok(summary) => view.article.llm_summary = Some(summary),
                Err(e) => tracing::warn!("Summary failed for article {}: {}", view.id(), e),
            }
            view
        });

        let enriched = join_all(tasks).await;
        tracing::debug!("Enriched {} articles", enriched.len());
        enriched
    }
}
